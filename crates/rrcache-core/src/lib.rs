// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod canonical;
mod config;
mod errors;
mod fingerprint;

pub use config::{resolve_rrcache_cache_dir, resolve_rrcache_config_path};
pub use errors::{Error, ErrorCode, Result};
pub use fingerprint::{sha512_hex, Fingerprint, FINGERPRINT_HEX_LEN};

pub const CRATE_NAME: &str = "rrcache-core";

pub const ENV_RRCACHE_CACHE_DIR: &str = "RRCACHE_CACHE_DIR";
pub const ENV_RRCACHE_CONFIG: &str = "RRCACHE_CONFIG";
