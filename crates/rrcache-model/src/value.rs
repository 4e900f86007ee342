// SPDX-License-Identifier: Apache-2.0

use serde::{Serialize, Serializer};

use crate::attribute::Attribute;
use crate::records::{
    CompartmentXref, CompoundTable, ForeignIndex, InchikeyIndex, NameTable, ReactionTable,
    RedirectTable, RuleLinkTable, XrefTable,
};

/// In-memory value of one attribute.
///
/// The wire form carries no tag: the attribute an artifact belongs to decides
/// how it is decoded, see [`AttributeValue::from_json_slice`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Redirects(RedirectTable),
    Compounds(CompoundTable),
    Names(NameTable),
    Xref(XrefTable),
    ForeignIndex(ForeignIndex),
    InchikeyIndex(InchikeyIndex),
    CompartmentXref(CompartmentXref),
    RuleLinks(RuleLinkTable),
    Reactions(ReactionTable),
}

impl AttributeValue {
    pub fn from_json_slice(attr: Attribute, bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match attr {
            Attribute::DeprecatedCompoundIds | Attribute::DeprecatedReactionIds => {
                Self::Redirects(serde_json::from_slice(bytes)?)
            }
            Attribute::DeprecatedCompartmentIds | Attribute::ChebiCompounds => {
                Self::ForeignIndex(serde_json::from_slice(bytes)?)
            }
            Attribute::CompoundStructures => Self::Compounds(serde_json::from_slice(bytes)?),
            Attribute::CompoundNames => Self::Names(serde_json::from_slice(bytes)?),
            Attribute::CompoundXref => Self::Xref(serde_json::from_slice(bytes)?),
            Attribute::InchikeyCompounds => Self::InchikeyIndex(serde_json::from_slice(bytes)?),
            Attribute::CompartmentXref => Self::CompartmentXref(serde_json::from_slice(bytes)?),
            Attribute::RuleReactions => Self::RuleLinks(serde_json::from_slice(bytes)?),
            Attribute::TemplateReactions => Self::Reactions(serde_json::from_slice(bytes)?),
        })
    }

    /// Whether this value has the shape `attr` expects.
    #[must_use]
    pub fn fits(&self, attr: Attribute) -> bool {
        matches!(
            (attr, self),
            (
                Attribute::DeprecatedCompoundIds | Attribute::DeprecatedReactionIds,
                Self::Redirects(_)
            ) | (
                Attribute::DeprecatedCompartmentIds | Attribute::ChebiCompounds,
                Self::ForeignIndex(_)
            ) | (Attribute::CompoundStructures, Self::Compounds(_))
                | (Attribute::CompoundNames, Self::Names(_))
                | (Attribute::CompoundXref, Self::Xref(_))
                | (Attribute::InchikeyCompounds, Self::InchikeyIndex(_))
                | (Attribute::CompartmentXref, Self::CompartmentXref(_))
                | (Attribute::RuleReactions, Self::RuleLinks(_))
                | (Attribute::TemplateReactions, Self::Reactions(_))
        )
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Redirects(m) | Self::Names(m) | Self::ForeignIndex(m) => m.len(),
            Self::Compounds(m) => m.len(),
            Self::Xref(x) => x.forward.len(),
            Self::InchikeyIndex(m) => m.len(),
            Self::CompartmentXref(m) => m.len(),
            Self::RuleLinks(m) => m.len(),
            Self::Reactions(m) => m.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_redirects(&self) -> Option<&RedirectTable> {
        match self {
            Self::Redirects(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_compounds(&self) -> Option<&CompoundTable> {
        match self {
            Self::Compounds(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_names(&self) -> Option<&NameTable> {
        match self {
            Self::Names(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_xref(&self) -> Option<&XrefTable> {
        match self {
            Self::Xref(x) => Some(x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_foreign_index(&self) -> Option<&ForeignIndex> {
        match self {
            Self::ForeignIndex(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_inchikey_index(&self) -> Option<&InchikeyIndex> {
        match self {
            Self::InchikeyIndex(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_compartment_xref(&self) -> Option<&CompartmentXref> {
        match self {
            Self::CompartmentXref(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_rule_links(&self) -> Option<&RuleLinkTable> {
        match self {
            Self::RuleLinks(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reactions(&self) -> Option<&ReactionTable> {
        match self {
            Self::Reactions(m) => Some(m),
            _ => None,
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Redirects(m) | Self::Names(m) | Self::ForeignIndex(m) => m.serialize(serializer),
            Self::Compounds(m) => m.serialize(serializer),
            Self::Xref(x) => x.serialize(serializer),
            Self::InchikeyIndex(m) => m.serialize(serializer),
            Self::CompartmentXref(m) => m.serialize(serializer),
            Self::RuleLinks(m) => m.serialize(serializer),
            Self::Reactions(m) => m.serialize(serializer),
        }
    }
}
