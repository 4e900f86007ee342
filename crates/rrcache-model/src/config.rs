// SPDX-License-Identifier: Apache-2.0

use rrcache_core::{ErrorCode, Fingerprint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use crate::attribute::{Attribute, SourceRole};
use crate::graph::DependencyGraph;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl ConfigError {
    #[must_use]
    pub const fn as_error_code(&self) -> ErrorCode {
        ErrorCode::ConfigInvalid
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", ErrorCode::ConfigInvalid.as_str(), self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Which reaction source schema a chemical space ships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SourceSchema {
    /// RetroRules flat rule file plus `rxn_recipes`.
    #[default]
    Legacy,
    /// Single reaction metadata table.
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub schema_version: String,
    #[serde(default)]
    pub default_space: Option<String>,
    pub spaces: Vec<ChemicalSpace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChemicalSpace {
    pub name: String,
    #[serde(default)]
    pub schema: SourceSchema,
    #[serde(default)]
    pub mirror_url: Option<String>,
    #[serde(default)]
    pub sources: Vec<InputSource>,
    #[serde(default)]
    pub compound_redirect_overrides: BTreeMap<String, String>,
    pub attributes: Vec<AttributeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSource {
    #[serde(default)]
    pub url: String,
    pub files: Vec<InputFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFile {
    pub name: String,
    #[serde(default)]
    pub fingerprint: Option<Fingerprint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    pub name: Attribute,
    #[serde(default)]
    pub attr_deps: Vec<Attribute>,
    #[serde(default)]
    pub file_deps: Vec<FileDep>,
    pub artifact: ArtifactSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDep {
    pub role: SourceRole,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    pub file: String,
    #[serde(default)]
    pub fingerprint: Option<Fingerprint>,
}

impl CacheConfig {
    /// Reads a JSON or TOML document, chosen by file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ConfigError(format!(
                "cannot read cache configuration {}: {e}",
                path.display()
            ))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            other => Err(ConfigError(format!(
                "unsupported cache configuration format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| ConfigError(format!("malformed cache configuration: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(raw)
            .map_err(|e| ConfigError(format!("malformed cache configuration: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(ConfigError(format!(
                "unsupported schema_version `{}` (expected {CONFIG_SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for space in &self.spaces {
            if !seen.insert(space.name.as_str()) {
                return Err(ConfigError(format!(
                    "chemical space `{}` declared twice",
                    space.name
                )));
            }
            DependencyGraph::new(space)?;
        }
        if let Some(default) = &self.default_space {
            self.space(default)?;
        }
        Ok(())
    }

    pub fn space(&self, name: &str) -> Result<&ChemicalSpace, ConfigError> {
        self.spaces
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError(format!("unknown chemical space `{name}`")))
    }

    /// The configured default space, or the only one when there is exactly one.
    pub fn default_space(&self) -> Result<&ChemicalSpace, ConfigError> {
        match (&self.default_space, self.spaces.as_slice()) {
            (Some(name), _) => self.space(name),
            (None, [only]) => Ok(only),
            (None, _) => Err(ConfigError(
                "no default_space configured and more than one space declared".to_string(),
            )),
        }
    }
}

impl ChemicalSpace {
    #[must_use]
    pub fn attribute(&self, attr: Attribute) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == attr)
    }

    /// Source URL and declaration of a raw input file.
    #[must_use]
    pub fn input_file(&self, name: &str) -> Option<(&InputSource, &InputFile)> {
        self.sources
            .iter()
            .find_map(|s| s.files.iter().find(|f| f.name == name).map(|f| (s, f)))
    }

    #[must_use]
    pub fn declared_attributes(&self) -> Vec<Attribute> {
        self.attributes.iter().map(|a| a.name).collect()
    }
}

impl AttributeSpec {
    #[must_use]
    pub fn file_for(&self, role: SourceRole) -> Option<&str> {
        self.file_deps
            .iter()
            .find(|d| d.role == role)
            .map(|d| d.file.as_str())
    }

    #[must_use]
    pub fn depends_on(&self, attr: Attribute) -> bool {
        self.attr_deps.contains(&attr)
    }
}
