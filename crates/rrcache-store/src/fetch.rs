// SPDX-License-Identifier: Apache-2.0

use rrcache_core::Fingerprint;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::transport::Downloader;
use crate::verify::{check, FileStatus};
use crate::{StoreError, StoreErrorCode};

#[must_use]
pub fn join_url(base: &str, file: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file)
}

/// Makes verified raw inputs available in an input-cache directory.
pub struct InputFetcher<'a> {
    dir: PathBuf,
    downloader: &'a dyn Downloader,
}

impl<'a> InputFetcher<'a> {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, downloader: &'a dyn Downloader) -> Self {
        Self {
            dir: dir.into(),
            downloader,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the local path of `file`, downloading it from `base_url` when
    /// absent or failing verification. A download that does not match
    /// `expected` is discarded.
    pub fn ensure(
        &self,
        file: &str,
        base_url: &str,
        expected: Option<&Fingerprint>,
    ) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(file);
        match check(&path, expected) {
            FileStatus::Valid => return Ok(path),
            FileStatus::Missing => {}
            FileStatus::Corrupt { .. } => {
                warn!(file, "cached input failed verification, fetching again");
            }
        }
        if base_url.is_empty() {
            return Err(StoreError::new(
                StoreErrorCode::MissingSource,
                format!("input `{file}` is not cached and has no source url"),
            ));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        let part = self.dir.join(format!(".{file}.part"));
        let url = join_url(base_url, file);
        info!(file, url = %url, "fetching input");
        if let Err(e) = self.downloader.download(&url, &part) {
            let _ = fs::remove_file(&part);
            return Err(StoreError::new(
                StoreErrorCode::MissingSource,
                format!("input `{file}` could not be fetched from {url}: {e}"),
            ));
        }

        match check(&part, expected) {
            FileStatus::Valid => {}
            FileStatus::Missing => {
                return Err(StoreError::new(
                    StoreErrorCode::MissingSource,
                    format!("input `{file}` was not written by the downloader"),
                ))
            }
            FileStatus::Corrupt { actual } => {
                let _ = fs::remove_file(&part);
                return Err(StoreError::new(
                    StoreErrorCode::CorruptedSource,
                    format!(
                        "input `{file}` fingerprint mismatch: expected {}, got {}",
                        expected.map_or_else(String::new, |f| f.to_hex()),
                        actual.map_or_else(|| "unreadable".to_string(), |a| a.to_hex())
                    ),
                ));
            }
        }
        fs::rename(&part, &path).map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        Ok(path)
    }
}
