// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::config::SourceSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

/// A named, independently cached derived dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    DeprecatedCompoundIds,
    DeprecatedReactionIds,
    DeprecatedCompartmentIds,
    CompoundStructures,
    CompoundNames,
    CompoundXref,
    ChebiCompounds,
    InchikeyCompounds,
    CompartmentXref,
    RuleReactions,
    TemplateReactions,
}

impl Attribute {
    pub const ALL: [Attribute; 11] = [
        Self::DeprecatedCompoundIds,
        Self::DeprecatedReactionIds,
        Self::DeprecatedCompartmentIds,
        Self::CompoundStructures,
        Self::CompoundNames,
        Self::CompoundXref,
        Self::ChebiCompounds,
        Self::InchikeyCompounds,
        Self::CompartmentXref,
        Self::RuleReactions,
        Self::TemplateReactions,
    ];

    /// Wire name used in configuration documents and artifact registries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeprecatedCompoundIds => "deprecatedCID_cid",
            Self::DeprecatedReactionIds => "deprecatedRID_rid",
            Self::DeprecatedCompartmentIds => "deprecatedCompID_compid",
            Self::CompoundStructures => "cid_strc",
            Self::CompoundNames => "cid_name",
            Self::CompoundXref => "cid_xref",
            Self::ChebiCompounds => "chebi_cid",
            Self::InchikeyCompounds => "inchikey_cid",
            Self::CompartmentXref => "comp_xref",
            Self::RuleReactions => "rr_reactions",
            Self::TemplateReactions => "template_reactions",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ValidationError(format!("unknown attribute `{s}`")))
    }

    /// Raw source roles the producer of this attribute cannot run without.
    #[must_use]
    pub const fn required_roles(self, schema: SourceSchema) -> &'static [SourceRole] {
        match (self, schema) {
            (Self::DeprecatedCompoundIds | Self::CompoundXref, _) => &[SourceRole::ChemXref],
            (Self::DeprecatedReactionIds, _) => &[SourceRole::ReacXref],
            (Self::DeprecatedCompartmentIds | Self::CompartmentXref, _) => &[SourceRole::CompXref],
            (Self::CompoundStructures | Self::CompoundNames, _) => &[SourceRole::Compounds],
            (Self::ChebiCompounds | Self::InchikeyCompounds, _) => &[],
            (Self::RuleReactions, SourceSchema::Legacy) => &[SourceRole::RuleLinks],
            (Self::TemplateReactions, SourceSchema::Legacy) => &[SourceRole::ReactionRecipes],
            (Self::RuleReactions | Self::TemplateReactions, SourceSchema::Metadata) => {
                &[SourceRole::ReactionMetadata]
            }
        }
    }

    /// Attributes the producer of this attribute cannot run without.
    #[must_use]
    pub const fn required_attr_deps(self) -> &'static [Attribute] {
        match self {
            Self::ChebiCompounds => &[Self::CompoundXref],
            Self::InchikeyCompounds => &[Self::CompoundStructures],
            _ => &[],
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Logical raw source a file plays for its parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    ChemXref,
    ReacXref,
    CompXref,
    ChemProp,
    Compounds,
    CompoundReplacements,
    RuleLinks,
    ReactionRecipes,
    ReactionMetadata,
}

impl SourceRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChemXref => "chem_xref",
            Self::ReacXref => "reac_xref",
            Self::CompXref => "comp_xref",
            Self::ChemProp => "chem_prop",
            Self::Compounds => "compounds",
            Self::CompoundReplacements => "compound_replacements",
            Self::RuleLinks => "rule_links",
            Self::ReactionRecipes => "reaction_recipes",
            Self::ReactionMetadata => "reaction_metadata",
        }
    }
}

impl Display for SourceRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Attribute;

    #[test]
    fn wire_names_round_trip() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::parse(attr.as_str()), Ok(attr));
            assert_eq!(attr.to_string(), attr.as_str());
        }
    }

    #[test]
    fn unknown_names_are_rejected_at_the_boundary() {
        let err = Attribute::parse("cid_smiles").expect_err("unknown");
        assert!(err.0.contains("cid_smiles"));
        let decoded: Result<Attribute, _> = serde_json::from_str("\"nope\"");
        assert!(decoded.is_err());
    }
}
