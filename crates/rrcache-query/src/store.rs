// SPDX-License-Identifier: Apache-2.0

use rrcache_core::{resolve_rrcache_cache_dir, ErrorCode};
use rrcache_ingest::{CacheBuilder, StructureConverter};
use rrcache_model::{Attribute, AttributeSpec, AttributeValue, ChemicalSpace, DependencyGraph};
use rrcache_store::{
    ArtifactMirror, ArtifactStore, CacheLayout, Downloader, MirrorError, StoreErrorCode,
    TransportErrorKind,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

use crate::{CacheError, LoadRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStoreConfig {
    pub root: PathBuf,
    /// Whether prebuilt artifacts may be fetched from the space's mirror.
    pub allow_download: bool,
}

impl CacheStoreConfig {
    /// Cache root from `RRCACHE_CACHE_DIR` and the usual fallbacks.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            root: resolve_rrcache_cache_dir(),
            allow_download: true,
        }
    }
}

impl Default for CacheStoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttributeState {
    #[default]
    Unloaded,
    Fetching,
    Building,
    Loaded,
    Error(String),
}

/// In-memory attribute values of one chemical space.
pub struct CacheStore<'a> {
    config: CacheStoreConfig,
    space: ChemicalSpace,
    artifacts: ArtifactStore,
    downloader: &'a dyn Downloader,
    converter: &'a dyn StructureConverter,
    values: BTreeMap<Attribute, AttributeValue>,
    states: BTreeMap<Attribute, AttributeState>,
}

impl<'a> CacheStore<'a> {
    pub fn open(
        config: CacheStoreConfig,
        space: ChemicalSpace,
        downloader: &'a dyn Downloader,
        converter: &'a dyn StructureConverter,
    ) -> Result<Self, CacheError> {
        DependencyGraph::new(&space)?;
        let artifacts = ArtifactStore::new(CacheLayout::new(config.root.clone(), space.name.clone()));
        Ok(Self {
            config,
            space,
            artifacts,
            downloader,
            converter,
            values: BTreeMap::new(),
            states: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn space(&self) -> &ChemicalSpace {
        &self.space
    }

    #[must_use]
    pub fn config(&self) -> &CacheStoreConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self, attr: Attribute) -> AttributeState {
        self.states.get(&attr).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_loaded(&self, attr: Attribute) -> bool {
        self.values.contains_key(&attr)
    }

    pub fn loaded(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.values.keys().copied()
    }

    /// Resident value of `attr`; logs when it has not been loaded.
    #[must_use]
    pub fn get(&self, attr: Attribute) -> Option<&AttributeValue> {
        let value = self.values.get(&attr);
        if value.is_none() {
            error!(attribute = %attr, state = ?self.state(attr), "attribute is not loaded");
        }
        value
    }

    /// Makes the requested attributes resident, in declaration order.
    #[instrument(skip(self), fields(space = %self.space.name))]
    pub fn load(&mut self, request: LoadRequest) -> Result<(), CacheError> {
        let wanted: BTreeSet<Attribute> = match request {
            LoadRequest::Nothing => return Ok(()),
            LoadRequest::Default => self.space.declared_attributes().into_iter().collect(),
            LoadRequest::Only(attrs) => attrs,
        };
        let ordered: Vec<Attribute> = self
            .space
            .declared_attributes()
            .into_iter()
            .filter(|a| wanted.contains(a))
            .collect();
        if let Some(undeclared) = wanted.iter().find(|a| !ordered.contains(a)) {
            return Err(CacheError::new(
                ErrorCode::ConfigInvalid,
                format!(
                    "attribute `{undeclared}` is not declared in space `{}`",
                    self.space.name
                ),
            ));
        }
        for attr in ordered {
            self.load_one(attr)?;
        }
        Ok(())
    }

    /// Loads `attr` unless it is resident or a previous lazy attempt failed.
    pub(crate) fn ensure(&mut self, attr: Attribute) -> Option<&AttributeValue> {
        if !self.values.contains_key(&attr) {
            if let Some(AttributeState::Error(message)) = self.states.get(&attr) {
                error!(attribute = %attr, error = %message, "attribute failed to load earlier");
                return None;
            }
            if let Err(e) = self.load(LoadRequest::only([attr])) {
                error!(attribute = %attr, error = %e, "attribute could not be loaded");
                return None;
            }
        }
        self.values.get(&attr)
    }

    fn load_one(&mut self, attr: Attribute) -> Result<(), CacheError> {
        if self.values.contains_key(&attr) {
            return Ok(());
        }
        let Some(spec) = self.space.attribute(attr).cloned() else {
            return Err(CacheError::new(
                ErrorCode::ConfigInvalid,
                format!("attribute `{attr}` is not declared"),
            ));
        };
        if self.load_from_disk(attr, &spec)? || self.fetch_from_mirror(attr, &spec)? {
            return Ok(());
        }
        self.rebuild(attr)
    }

    fn load_from_disk(&mut self, attr: Attribute, spec: &AttributeSpec) -> Result<bool, CacheError> {
        match self.artifacts.load(attr, &spec.artifact) {
            Ok(value) => {
                debug!(attribute = %attr, "attribute loaded from disk");
                self.resident(attr, value);
                Ok(true)
            }
            Err(e)
                if matches!(
                    e.code,
                    StoreErrorCode::NotFound | StoreErrorCode::ArtifactCorrupt | StoreErrorCode::Decode
                ) =>
            {
                info!(attribute = %attr, reason = %e, "artifact not usable on disk");
                Ok(false)
            }
            Err(e) => {
                self.fail(attr, &e.to_string());
                Err(e.into())
            }
        }
    }

    fn fetch_from_mirror(&mut self, attr: Attribute, spec: &AttributeSpec) -> Result<bool, CacheError> {
        if !self.config.allow_download {
            return Ok(false);
        }
        let (Some(base_url), Some(expected)) = (&self.space.mirror_url, &spec.artifact.fingerprint)
        else {
            return Ok(false);
        };
        self.states.insert(attr, AttributeState::Fetching);
        let dest = self.artifacts.path(&spec.artifact);
        let mirror = ArtifactMirror::new(base_url.clone(), self.downloader);
        match mirror.fetch(&spec.artifact.file, expected, &dest) {
            Ok(()) => {}
            Err(MirrorError::Transport(e))
                if matches!(
                    e.kind,
                    TransportErrorKind::Connection
                        | TransportErrorKind::InvalidUrl
                        | TransportErrorKind::NotFound
                        | TransportErrorKind::Status
                ) =>
            {
                warn!(attribute = %attr, error = %e, "mirror unavailable, rebuilding locally");
                return Ok(false);
            }
            Err(e @ MirrorError::Mismatch { .. }) => {
                warn!(attribute = %attr, error = %e, "mirror artifact rejected, rebuilding locally");
                return Ok(false);
            }
            Err(e) => {
                let code = match &e {
                    MirrorError::Io(inner) => inner.code.as_error_code(),
                    _ => ErrorCode::Transport,
                };
                self.fail(attr, &e.to_string());
                return Err(CacheError::new(code, e.to_string()));
            }
        }
        match self.artifacts.load(attr, &spec.artifact) {
            Ok(value) => {
                info!(attribute = %attr, "attribute installed from mirror");
                self.resident(attr, value);
                Ok(true)
            }
            Err(e) => {
                warn!(attribute = %attr, error = %e, "mirrored artifact does not decode, rebuilding locally");
                Ok(false)
            }
        }
    }

    fn rebuild(&mut self, attr: Attribute) -> Result<(), CacheError> {
        self.states.insert(attr, AttributeState::Building);
        let outcome = CacheBuilder::new(&self.space, &self.config.root, self.downloader, self.converter)
            .and_then(|builder| builder.build_collecting(&BTreeSet::from([attr])));
        let (report, values) = match outcome {
            Ok(done) => done,
            Err(e) => {
                self.fail(attr, &e.to_string());
                return Err(e.into());
            }
        };
        info!(
            attribute = %attr,
            built = report.built.len(),
            warnings = report.warnings.len(),
            "attribute rebuilt"
        );
        for (produced, value) in values {
            if !self.values.contains_key(&produced) {
                self.resident(produced, value);
            }
        }
        if self.values.contains_key(&attr) {
            return Ok(());
        }
        let message = format!("`{attr}` verified on disk but could not be decoded");
        self.fail(attr, &message);
        Err(CacheError::new(ErrorCode::Decode, message))
    }

    fn resident(&mut self, attr: Attribute, value: AttributeValue) {
        self.values.insert(attr, value);
        self.states.insert(attr, AttributeState::Loaded);
    }

    fn fail(&mut self, attr: Attribute, message: &str) {
        error!(attribute = %attr, error = %message, "attribute load failed");
        self.states
            .insert(attr, AttributeState::Error(message.to_string()));
    }
}
