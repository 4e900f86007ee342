// SPDX-License-Identifier: Apache-2.0

//! Exact-key lookups. Each one lazily loads the single attribute it reads.

use rrcache_model::{
    redirect_lookup, Attribute, AttributeValue, CompoundRecord, ReactionRecord, RuleReactionLink,
};
use std::collections::BTreeMap;
use tracing::error;

use crate::store::CacheStore;

fn missing<T>(attr: Attribute, key: &str) -> Option<T> {
    error!(attribute = %attr, key, "no entry for key");
    None
}

impl CacheStore<'_> {
    pub fn get_compound(&mut self, cid: &str) -> Option<&CompoundRecord> {
        let attr = Attribute::CompoundStructures;
        match self.ensure(attr).and_then(AttributeValue::as_compounds) {
            Some(table) => table.get(cid).or_else(|| missing(attr, cid)),
            None => None,
        }
    }

    pub fn get_reaction(&mut self, rid: &str) -> Option<&ReactionRecord> {
        let attr = Attribute::TemplateReactions;
        match self.ensure(attr).and_then(AttributeValue::as_reactions) {
            Some(table) => table.get(rid).or_else(|| missing(attr, rid)),
            None => None,
        }
    }

    /// Reactions linked to one rule, keyed by reaction id.
    pub fn get_reaction_rule(&mut self, rule_id: &str) -> Option<&BTreeMap<String, RuleReactionLink>> {
        let attr = Attribute::RuleReactions;
        match self.ensure(attr).and_then(AttributeValue::as_rule_links) {
            Some(table) => table.get(rule_id).or_else(|| missing(attr, rule_id)),
            None => None,
        }
    }

    pub fn list_compounds(&mut self) -> Option<Vec<&str>> {
        let table = self
            .ensure(Attribute::CompoundStructures)
            .and_then(AttributeValue::as_compounds)?;
        Some(table.keys().map(String::as_str).collect())
    }

    pub fn list_reactions(&mut self) -> Option<Vec<&str>> {
        let table = self
            .ensure(Attribute::TemplateReactions)
            .and_then(AttributeValue::as_reactions)?;
        Some(table.keys().map(String::as_str).collect())
    }

    pub fn list_reaction_rules(&mut self) -> Option<Vec<&str>> {
        let table = self
            .ensure(Attribute::RuleReactions)
            .and_then(AttributeValue::as_rule_links)?;
        Some(table.keys().map(String::as_str).collect())
    }

    /// Current id of a possibly deprecated compound id; unknown ids map to themselves.
    pub fn resolve_compound_id(&mut self, cid: &str) -> String {
        self.resolve(Attribute::DeprecatedCompoundIds, cid)
    }

    /// Current id of a possibly deprecated reaction id; unknown ids map to themselves.
    pub fn resolve_reaction_id(&mut self, rid: &str) -> String {
        self.resolve(Attribute::DeprecatedReactionIds, rid)
    }

    /// Compartment id of a foreign compartment id such as `c` or `c0`.
    pub fn resolve_compartment_id(&mut self, foreign_id: &str) -> Option<&str> {
        let attr = Attribute::DeprecatedCompartmentIds;
        match self.ensure(attr).and_then(AttributeValue::as_foreign_index) {
            Some(index) => index
                .get(foreign_id)
                .map(String::as_str)
                .or_else(|| missing(attr, foreign_id)),
            None => None,
        }
    }

    pub fn compounds_by_inchikey(&mut self, inchikey: &str) -> Option<&[String]> {
        let attr = Attribute::InchikeyCompounds;
        match self.ensure(attr).and_then(AttributeValue::as_inchikey_index) {
            Some(index) => index
                .get(inchikey)
                .map(Vec::as_slice)
                .or_else(|| missing(attr, inchikey)),
            None => None,
        }
    }

    pub fn compound_by_chebi(&mut self, chebi_id: &str) -> Option<&str> {
        let attr = Attribute::ChebiCompounds;
        match self.ensure(attr).and_then(AttributeValue::as_foreign_index) {
            Some(index) => index
                .get(chebi_id)
                .map(String::as_str)
                .or_else(|| missing(attr, chebi_id)),
            None => None,
        }
    }

    fn resolve(&mut self, attr: Attribute, id: &str) -> String {
        match self.ensure(attr).and_then(AttributeValue::as_redirects) {
            Some(table) => redirect_lookup(id, table).to_string(),
            None => id.to_string(),
        }
    }
}
