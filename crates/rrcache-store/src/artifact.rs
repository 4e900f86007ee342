// SPDX-License-Identifier: Apache-2.0

use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use rrcache_core::canonical::stable_json_bytes;
use rrcache_core::Fingerprint;
use rrcache_model::{ArtifactSpec, Attribute, AttributeValue};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::layout::CacheLayout;
use crate::verify::{check, fingerprint_file, FileStatus};
use crate::{StoreError, StoreErrorCode};

pub const SIDECAR_SUFFIX: &str = ".sha512";

fn is_gzip_name(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "gz")
}

/// Canonical JSON, gzip-wrapped with a fixed header when `path` ends in `.gz`.
pub fn encode_artifact_bytes<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>, StoreError> {
    let json = stable_json_bytes(value)
        .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
    if !is_gzip_name(path) {
        return Ok(json);
    }
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(255)
        .write(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))
}

pub fn decode_artifact_bytes(path: &Path, raw: &[u8]) -> Result<Vec<u8>, StoreError> {
    if !is_gzip_name(path) {
        return Ok(raw.to_vec());
    }
    let mut out = Vec::new();
    GzDecoder::new(raw)
        .read_to_end(&mut out)
        .map_err(|e| StoreError::new(StoreErrorCode::Decode, format!("{}: {e}", path.display())))?;
    Ok(out)
}

#[must_use]
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Fingerprint recorded next to an artifact when it was written.
#[must_use]
pub fn read_sidecar(path: &Path) -> Option<Fingerprint> {
    let raw = fs::read_to_string(sidecar_path(path)).ok()?;
    let first = raw.split_whitespace().next()?;
    Fingerprint::parse(first).ok()
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = fs::File::create(path)
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
    f.write_all(bytes)
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
    f.sync_all()
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
    Ok(())
}

pub(crate) fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    let f = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
    f.sync_all()
        .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Installs the sidecar of `artifact` through a synced temporary file.
pub(crate) fn write_sidecar(artifact: &Path, fingerprint: &Fingerprint, file: &str) -> Result<(), StoreError> {
    let sidecar = sidecar_path(artifact);
    let sidecar_tmp = tmp_path(&sidecar);
    write_and_sync(&sidecar_tmp, format!("{}  {file}\n", fingerprint.to_hex()).as_bytes())?;
    fs::rename(&sidecar_tmp, &sidecar).map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))
}

/// Artifacts of one chemical space.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    layout: CacheLayout,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    #[must_use]
    pub fn path(&self, spec: &ArtifactSpec) -> PathBuf {
        self.layout.artifact_path(&spec.file)
    }

    /// Checks against the declared fingerprint, else the build-time sidecar.
    #[must_use]
    pub fn status(&self, spec: &ArtifactSpec) -> FileStatus {
        let path = self.path(spec);
        if let Some(declared) = &spec.fingerprint {
            return check(&path, Some(declared));
        }
        if !path.is_file() {
            return FileStatus::Missing;
        }
        match read_sidecar(&path) {
            Some(recorded) => check(&path, Some(&recorded)),
            None => FileStatus::Corrupt {
                actual: fingerprint_file(&path).ok(),
            },
        }
    }

    /// Verifies then decodes one artifact.
    pub fn load(&self, attr: Attribute, spec: &ArtifactSpec) -> Result<AttributeValue, StoreError> {
        let path = self.path(spec);
        match self.status(spec) {
            FileStatus::Valid => {}
            FileStatus::Missing => {
                return Err(StoreError::new(
                    StoreErrorCode::NotFound,
                    format!("artifact {} is missing", path.display()),
                ))
            }
            FileStatus::Corrupt { actual } => {
                return Err(StoreError::new(
                    StoreErrorCode::ArtifactCorrupt,
                    format!(
                        "artifact {} failed fingerprint verification (actual {})",
                        path.display(),
                        actual.map_or_else(|| "unreadable".to_string(), Fingerprint::to_hex)
                    ),
                ))
            }
        }
        let raw = fs::read(&path).map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        let json = decode_artifact_bytes(&path, &raw)?;
        let value = AttributeValue::from_json_slice(attr, &json).map_err(|e| {
            StoreError::new(
                StoreErrorCode::Decode,
                format!("artifact {} does not decode as {attr}: {e}", path.display()),
            )
        })?;
        debug!(attribute = %attr, path = %path.display(), "artifact loaded");
        Ok(value)
    }

    /// Atomically writes the artifact and its sidecar; returns the written fingerprint.
    pub fn persist(&self, spec: &ArtifactSpec, value: &AttributeValue) -> Result<Fingerprint, StoreError> {
        let path = self.path(spec);
        let bytes = encode_artifact_bytes(&path, value)?;
        self.persist_bytes(spec, &bytes)
    }

    /// Atomically installs already-encoded artifact bytes and their sidecar.
    pub fn persist_bytes(&self, spec: &ArtifactSpec, bytes: &[u8]) -> Result<Fingerprint, StoreError> {
        let dir = self.layout.artifact_dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        let path = self.path(spec);
        let fingerprint = Fingerprint::of_bytes(bytes);

        let artifact_tmp = tmp_path(&path);
        write_and_sync(&artifact_tmp, bytes)?;
        fs::rename(&artifact_tmp, &path)
            .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        write_sidecar(&path, &fingerprint, &spec.file)?;
        sync_dir(&dir)?;
        debug!(path = %path.display(), fingerprint = %fingerprint, "artifact persisted");
        Ok(fingerprint)
    }
}
