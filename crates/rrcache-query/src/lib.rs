// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Runtime access to a built cache.
//!
//! [`CacheStore`] keeps the attribute values of one chemical space in memory
//! and fills them on demand from disk, a prebuilt mirror, or a local rebuild.

mod lookup;
mod store;

use rrcache_core::ErrorCode;
use rrcache_ingest::IngestError;
use rrcache_model::{Attribute, ConfigError};
use rrcache_store::StoreError;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const CRATE_NAME: &str = "rrcache-query";

pub use store::{AttributeState, CacheStore, CacheStoreConfig};

/// Which attributes a [`CacheStore::load`] call should make resident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadRequest {
    Nothing,
    /// Every attribute the space declares.
    #[default]
    Default,
    Only(BTreeSet<Attribute>),
}

impl LoadRequest {
    #[must_use]
    pub fn only(attrs: impl IntoIterator<Item = Attribute>) -> Self {
        Self::Only(attrs.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheError {
    pub code: ErrorCode,
    pub message: String,
}

impl CacheError {
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

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CacheError {}

impl From<IngestError> for CacheError {
    fn from(value: IngestError) -> Self {
        Self::new(value.as_error_code(), value.message)
    }
}

impl From<StoreError> for CacheError {
    fn from(value: StoreError) -> Self {
        Self::new(value.code.as_error_code(), value.message)
    }
}

impl From<ConfigError> for CacheError {
    fn from(value: ConfigError) -> Self {
        Self::new(value.as_error_code(), value.0)
    }
}
