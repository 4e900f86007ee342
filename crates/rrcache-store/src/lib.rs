// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod artifact;
mod fetch;
mod layout;
mod mirror;
mod retry;
mod transport;
mod verify;

use rrcache_core::ErrorCode;
use std::fmt::{Display, Formatter};

pub use artifact::{
    decode_artifact_bytes, encode_artifact_bytes, read_sidecar, sidecar_path, ArtifactStore,
    SIDECAR_SUFFIX,
};
pub use fetch::{join_url, InputFetcher};
pub use layout::{CacheLayout, ARTIFACT_DIR, INPUT_DIR};
pub use mirror::{ArtifactMirror, MirrorError};
pub use retry::RetryPolicy;
pub use transport::{Downloader, HttpDownloader, TransportError, TransportErrorKind};
pub use verify::{check, fingerprint_file, verify, FileStatus};

pub const CRATE_NAME: &str = "rrcache-store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    ArtifactCorrupt,
    MissingSource,
    CorruptedSource,
    Transport,
    Decode,
    Io,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ArtifactCorrupt => "artifact_corrupt",
            Self::MissingSource => "missing_source",
            Self::CorruptedSource => "corrupted_source",
            Self::Transport => "transport_error",
            Self::Decode => "decode_error",
            Self::Io => "io_error",
            Self::Internal => "internal_error",
        }
    }

    #[must_use]
    pub const fn as_error_code(self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::ArtifactMissing,
            Self::ArtifactCorrupt => ErrorCode::ArtifactCorrupt,
            Self::MissingSource => ErrorCode::MissingSource,
            Self::CorruptedSource => ErrorCode::CorruptedSource,
            Self::Transport => ErrorCode::Transport,
            Self::Decode => ErrorCode::Decode,
            Self::Io => ErrorCode::Io,
            Self::Internal => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}
