// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Reaction-rule cache model SSOT.
//!
//! ```compile_fail
//! use rrcache_model::SourceSchema;
//!
//! fn exhaustive_match(s: SourceSchema) -> &'static str {
//!     match s {
//!         SourceSchema::Legacy => "legacy",
//!         SourceSchema::Metadata => "metadata",
//!     }
//! }
//! ```

mod attribute;
mod config;
mod graph;
mod records;
mod value;

pub use attribute::{Attribute, SourceRole, ValidationError};
pub use config::{
    ArtifactSpec, AttributeSpec, CacheConfig, ChemicalSpace, ConfigError, FileDep, InputFile,
    InputSource, SourceSchema, CONFIG_SCHEMA_VERSION,
};
pub use graph::DependencyGraph;
pub use records::{
    redirect_lookup, CompartmentXref, CompoundRecord, CompoundTable, ForeignIndex, InchikeyIndex,
    NameTable, ReactionRecord, ReactionTable, RedirectTable, RuleLinkTable, RuleReactionLink,
    Stoichiometry, XrefBundle, XrefTable, DIRECTION_BIDIRECTIONAL, DIRECTION_FORWARD,
    DIRECTION_REVERSE, NO_INCHIKEY,
};
pub use value::AttributeValue;

pub const CRATE_NAME: &str = "rrcache-model";
