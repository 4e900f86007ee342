// SPDX-License-Identifier: Apache-2.0

use rrcache_core::Fingerprint;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

/// Outcome of checking a file against its expected fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Valid,
    Missing,
    Corrupt { actual: Option<Fingerprint> },
}

impl FileStatus {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

pub fn fingerprint_file(path: &Path) -> std::io::Result<Fingerprint> {
    let file = File::open(path)?;
    Fingerprint::of_reader(BufReader::new(file))
}

/// Classifies `path`. With no expected fingerprint, presence is enough.
#[must_use]
pub fn check(path: &Path, expected: Option<&Fingerprint>) -> FileStatus {
    if !path.is_file() {
        return FileStatus::Missing;
    }
    let Some(expected) = expected else {
        return FileStatus::Valid;
    };
    match fingerprint_file(path) {
        Ok(actual) if actual == *expected => FileStatus::Valid,
        Ok(actual) => FileStatus::Corrupt {
            actual: Some(actual),
        },
        Err(e) if e.kind() == ErrorKind::NotFound => FileStatus::Missing,
        Err(_) => FileStatus::Corrupt { actual: None },
    }
}

#[must_use]
pub fn verify(path: &Path, expected: &Fingerprint) -> bool {
    check(path, Some(expected)).is_valid()
}
