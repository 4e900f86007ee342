// SPDX-License-Identifier: Apache-2.0

use rrcache_core::ErrorCode;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureFormat {
    Inchi,
    Smiles,
    Inchikey,
}

impl StructureFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inchi => "inchi",
            Self::Smiles => "smiles",
            Self::Inchikey => "inchikey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureConversionError {
    pub from: StructureFormat,
    pub to: StructureFormat,
    pub message: String,
}

impl StructureConversionError {
    #[must_use]
    pub const fn as_error_code(&self) -> ErrorCode {
        ErrorCode::StructureConversion
    }
}

impl Display for StructureConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} -> {}: {}",
            ErrorCode::StructureConversion.as_str(),
            self.from.as_str(),
            self.to.as_str(),
            self.message
        )
    }
}

impl std::error::Error for StructureConversionError {}

/// Chemistry toolkit seam used to derive missing structure representations.
pub trait StructureConverter {
    fn convert(
        &self,
        structure: &str,
        from: StructureFormat,
        to: StructureFormat,
    ) -> Result<String, StructureConversionError>;
}

impl<F> StructureConverter for F
where
    F: Fn(&str, StructureFormat, StructureFormat) -> Result<String, StructureConversionError>,
{
    fn convert(
        &self,
        structure: &str,
        from: StructureFormat,
        to: StructureFormat,
    ) -> Result<String, StructureConversionError> {
        self(structure, from, to)
    }
}

/// Declines every conversion; derived representations stay null.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableConverter;

impl StructureConverter for UnavailableConverter {
    fn convert(
        &self,
        _structure: &str,
        from: StructureFormat,
        to: StructureFormat,
    ) -> Result<String, StructureConversionError> {
        Err(StructureConversionError {
            from,
            to,
            message: "no structure toolkit configured".to_string(),
        })
    }
}
