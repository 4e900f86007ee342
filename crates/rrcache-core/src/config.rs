// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn resolve_rrcache_cache_dir() -> PathBuf {
    if let Some(explicit) = non_empty_env(crate::ENV_RRCACHE_CACHE_DIR) {
        return PathBuf::from(explicit);
    }
    if let Some(xdg_cache_home) = non_empty_env("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache_home).join("rrcache");
    }
    if let Some(home) = non_empty_env("HOME") {
        return PathBuf::from(home).join(".cache").join("rrcache");
    }
    PathBuf::from(".rrcache").join("cache")
}

/// Location of the cache configuration document, if one is configured.
#[must_use]
pub fn resolve_rrcache_config_path() -> Option<PathBuf> {
    non_empty_env(crate::ENV_RRCACHE_CONFIG).map(PathBuf::from)
}
