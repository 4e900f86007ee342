// SPDX-License-Identifier: Apache-2.0

use rrcache_core::Fingerprint;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::artifact::{sync_dir, write_sidecar};
use crate::fetch::join_url;
use crate::transport::{Downloader, TransportError};
use crate::verify::fingerprint_file;
use crate::{StoreError, StoreErrorCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    Transport(TransportError),
    Mismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },
    Io(StoreError),
}

impl Display for MirrorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "mirror transport failed: {e}"),
            Self::Mismatch { expected, actual } => {
                write!(f, "mirror artifact mismatch: expected {expected}, got {actual}")
            }
            Self::Io(e) => write!(f, "mirror write failed: {e}"),
        }
    }
}

impl std::error::Error for MirrorError {}

/// Prebuilt artifacts published under a base URL.
pub struct ArtifactMirror<'a> {
    base_url: String,
    downloader: &'a dyn Downloader,
}

impl<'a> ArtifactMirror<'a> {
    #[must_use]
    pub fn new(base_url: impl Into<String>, downloader: &'a dyn Downloader) -> Self {
        Self {
            base_url: base_url.into(),
            downloader,
        }
    }

    /// Downloads `file` into `dest` only if it matches `expected`, then
    /// records the fingerprint sidecar.
    pub fn fetch(&self, file: &str, expected: &Fingerprint, dest: &Path) -> Result<(), MirrorError> {
        let io = |e: std::io::Error| MirrorError::Io(StoreError::new(StoreErrorCode::Io, e.to_string()));
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir).map_err(io)?;
        }
        let mut part = dest.as_os_str().to_os_string();
        part.push(".part");
        let part = Path::new(&part).to_path_buf();

        let url = join_url(&self.base_url, file);
        info!(file, url = %url, "fetching prebuilt artifact");
        if let Err(e) = self.downloader.download(&url, &part) {
            let _ = fs::remove_file(&part);
            return Err(MirrorError::Transport(e));
        }
        let actual = fingerprint_file(&part).map_err(io)?;
        if actual != *expected {
            let _ = fs::remove_file(&part);
            return Err(MirrorError::Mismatch {
                expected: *expected,
                actual,
            });
        }
        fs::rename(&part, dest).map_err(io)?;
        write_sidecar(dest, &actual, file).map_err(MirrorError::Io)?;
        if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
            sync_dir(dir).map_err(MirrorError::Io)?;
        }
        Ok(())
    }
}
