// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum WarningKind {
    MissingColumn,
    MalformedRow,
    MissingStructure,
    ConversionFailed,
    BadEquation,
    BadDirection,
    BadScore,
    UnknownCompound,
    UnknownReaction,
    DirectionConflict,
}

impl WarningKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingColumn => "missing_column",
            Self::MalformedRow => "malformed_row",
            Self::MissingStructure => "missing_structure",
            Self::ConversionFailed => "conversion_failed",
            Self::BadEquation => "bad_equation",
            Self::BadDirection => "bad_direction",
            Self::BadScore => "bad_score",
            Self::UnknownCompound => "unknown_compound",
            Self::UnknownReaction => "unknown_reaction",
            Self::DirectionConflict => "direction_conflict",
        }
    }
}

/// A skipped or degraded input row. `line` is 1-based; 0 means the
/// warning is not tied to a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowWarning {
    pub line: usize,
    pub kind: WarningKind,
    pub message: String,
}

/// Parser output plus the rows it had to skip or degrade.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<RowWarning>,
}

impl<T> Parsed<T> {
    #[must_use]
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn has(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    warnings: Vec<RowWarning>,
}

impl Diagnostics {
    pub(crate) fn warn(&mut self, line: usize, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        warn!(line, kind = kind.as_str(), "{message}");
        self.warnings.push(RowWarning {
            line,
            kind,
            message,
        });
    }

    pub(crate) fn absorb(&mut self, warnings: Vec<RowWarning>) {
        self.warnings.extend(warnings);
    }

    pub(crate) fn finish<T>(self, value: T) -> Parsed<T> {
        Parsed {
            value,
            warnings: self.warnings,
        }
    }
}
