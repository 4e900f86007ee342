// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Raw MetaNetX / RetroRules tables to cache attribute values.
//!
//! Parsers are pure functions over [`TsvTable`]s; [`CacheBuilder`] drives them
//! in dependency order and persists the resulting artifacts.

mod build;
mod compounds;
mod convert;
mod diagnostics;
mod logging;
mod reactions;
mod stoichiometry;
mod tsv;
mod xref;

use rrcache_core::ErrorCode;
use rrcache_model::ConfigError;
use rrcache_store::StoreError;
use std::fmt::{Display, Formatter};

pub const CRATE_NAME: &str = "rrcache-ingest";

pub use build::{BuildReport, CacheBuilder};
pub use compounds::{apply_compound_replacements, index_inchikey, parse_compounds, CompoundTables};
pub use convert::{
    StructureConversionError, StructureConverter, StructureFormat, UnavailableConverter,
};
pub use diagnostics::{Parsed, RowWarning, WarningKind};
pub use logging::{BuildEvent, BuildLog, BuildStage};
pub use reactions::{
    alias_deprecated_reactions, parse_reaction_metadata, parse_rule_links,
    parse_template_reactions, reaction_schema, LegacySchema, MetadataSchema, ReactionSchema,
    ReactionTables,
};
pub use stoichiometry::{
    parse_coefficient, parse_equation, rescue_coefficient, split_equation, EquationError,
};
pub use tsv::{Delimiter, HeaderMode, TsvRow, TsvTable};
pub use xref::{index_foreign, parse_compartment_xref, parse_deprecated_ids, parse_xref};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestError {
    pub code: ErrorCode,
    pub message: String,
}

impl IngestError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn as_error_code(&self) -> ErrorCode {
        self.code
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for IngestError {}

impl From<StoreError> for IngestError {
    fn from(value: StoreError) -> Self {
        Self::new(value.code.as_error_code(), value.message)
    }
}

impl From<ConfigError> for IngestError {
    fn from(value: ConfigError) -> Self {
        Self::new(value.as_error_code(), value.0)
    }
}
