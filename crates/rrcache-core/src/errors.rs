// SPDX-License-Identifier: Apache-2.0

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable machine-readable classification shared by every crate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ErrorCode {
    ConfigInvalid,
    MissingSource,
    CorruptedSource,
    ArtifactMissing,
    ArtifactCorrupt,
    Transport,
    Io,
    Decode,
    StructureConversion,
    LookupMiss,
    Internal,
}

pub const ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::ConfigInvalid,
    ErrorCode::MissingSource,
    ErrorCode::CorruptedSource,
    ErrorCode::ArtifactMissing,
    ErrorCode::ArtifactCorrupt,
    ErrorCode::Transport,
    ErrorCode::Io,
    ErrorCode::Decode,
    ErrorCode::StructureConversion,
    ErrorCode::LookupMiss,
    ErrorCode::Internal,
];

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigInvalid => "config_invalid",
            Self::MissingSource => "missing_source",
            Self::CorruptedSource => "corrupted_source",
            Self::ArtifactMissing => "artifact_missing",
            Self::ArtifactCorrupt => "artifact_corrupt",
            Self::Transport => "transport",
            Self::Io => "io",
            Self::Decode => "decode",
            Self::StructureConversion => "structure_conversion",
            Self::LookupMiss => "lookup_miss",
            Self::Internal => "internal",
        }
    }

    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        ERROR_CODES.iter().copied().find(|c| c.as_str() == input)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    SerdeJson(serde_json::Error),
    InvalidFingerprint { value: String, reason: &'static str },
}

impl Error {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SerdeJson(_) => ErrorCode::Decode,
            Self::InvalidFingerprint { .. } => ErrorCode::ConfigInvalid,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerdeJson(err) => write!(f, "serde json error: {err}"),
            Self::InvalidFingerprint { value, reason } => {
                write!(f, "invalid fingerprint `{value}`: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerdeJson(err) => Some(err),
            Self::InvalidFingerprint { .. } => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::SerdeJson(value)
    }
}
