// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DIRECTION_FORWARD: i8 = 1;
pub const DIRECTION_REVERSE: i8 = -1;
pub const DIRECTION_BIDIRECTIONAL: i8 = 0;

/// Bucket used in the InChIKey index for compounds without a key.
pub const NO_INCHIKEY: &str = "NO_INCHIKEY";

/// Compound id to stoichiometric coefficient.
pub type Stoichiometry = BTreeMap<String, f64>;
/// External database name to foreign ids, in first-seen order.
pub type XrefBundle = BTreeMap<String, Vec<String>>;

pub type CompoundTable = BTreeMap<String, CompoundRecord>;
pub type NameTable = BTreeMap<String, String>;
pub type RedirectTable = BTreeMap<String, String>;
pub type ForeignIndex = BTreeMap<String, String>;
pub type InchikeyIndex = BTreeMap<String, Vec<String>>;
pub type CompartmentXref = BTreeMap<String, XrefBundle>;
pub type RuleLinkTable = BTreeMap<String, BTreeMap<String, RuleReactionLink>>;
pub type ReactionTable = BTreeMap<String, ReactionRecord>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundRecord {
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub smiles: Option<String>,
    #[serde(default)]
    pub inchi: Option<String>,
    #[serde(default)]
    pub inchikey: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xref: Option<XrefBundle>,
}

impl CompoundRecord {
    #[must_use]
    pub fn has_structure(&self) -> bool {
        self.inchi.is_some() || self.smiles.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionRecord {
    pub left: Stoichiometry,
    pub right: Stoichiometry,
    pub direction: i8,
    pub main_left: Vec<String>,
    pub main_right: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleReactionLink {
    pub rule_id: String,
    pub rule_score: f64,
    pub reac_id: String,
    pub subs_id: String,
    pub rel_direction: i8,
    pub left: Stoichiometry,
    pub right: Stoichiometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_excluded: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_excluded: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "map_is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Internal id to foreign references, plus the foreign-to-internal index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XrefTable {
    pub forward: BTreeMap<String, XrefBundle>,
    pub reverse: BTreeMap<String, BTreeMap<String, String>>,
}

impl XrefTable {
    #[must_use]
    pub fn internal_id(&self, db: &str, foreign_id: &str) -> Option<&str> {
        self.reverse
            .get(db)
            .and_then(|ids| ids.get(foreign_id))
            .map(String::as_str)
    }
}

fn map_is_empty<K, V>(value: &BTreeMap<K, V>) -> bool {
    value.is_empty()
}

/// `table[x]` when present, `x` otherwise.
#[must_use]
pub fn redirect_lookup<'a>(id: &'a str, table: &'a RedirectTable) -> &'a str {
    table.get(id).map_or(id, String::as_str)
}
