// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

pub const ARTIFACT_DIR: &str = "cache";
pub const INPUT_DIR: &str = "input-cache";

/// On-disk layout of one chemical space under a cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
    space: String,
}

impl CacheLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, space: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            space: space.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn space(&self) -> &str {
        &self.space
    }

    #[must_use]
    pub fn artifact_dir(&self) -> PathBuf {
        self.root.join(ARTIFACT_DIR).join(&self.space)
    }

    #[must_use]
    pub fn input_dir(&self) -> PathBuf {
        self.root.join(INPUT_DIR).join(&self.space)
    }

    #[must_use]
    pub fn artifact_path(&self, file: &str) -> PathBuf {
        self.artifact_dir().join(file)
    }

    #[must_use]
    pub fn input_path(&self, file: &str) -> PathBuf {
        self.input_dir().join(file)
    }
}
