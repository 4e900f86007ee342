// SPDX-License-Identifier: Apache-2.0

mod support;

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use rrcache_core::ErrorCode;
use rrcache_ingest::UnavailableConverter;
use rrcache_model::Attribute;
use rrcache_query::{AttributeState, CacheStore, CacheStoreConfig, LoadRequest};
use rrcache_store::{
    read_sidecar, ArtifactStore, CacheLayout, Downloader, HttpDownloader, TransportError,
    TransportErrorKind,
};
use tempfile::tempdir;

use support::{flip_last_byte, legacy_space, publish, published, MIRROR, SPACE};

fn config(root: &Path) -> CacheStoreConfig {
    CacheStoreConfig {
        root: root.to_path_buf(),
        allow_download: true,
    }
}

#[test]
fn nothing_request_is_a_no_op() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let mut store = CacheStore::open(config(root.path()), legacy_space(), &downloader, &UnavailableConverter)
        .expect("open");

    store.load(LoadRequest::Nothing).expect("no-op load");

    assert_eq!(store.loaded().count(), 0);
    assert_eq!(store.state(Attribute::CompoundXref), AttributeState::Unloaded);
    assert!(!root.path().join("cache").exists());
    assert!(!root.path().join("input-cache").exists());
}

#[test]
fn default_request_loads_every_declared_attribute() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let mut store = CacheStore::open(config(root.path()), legacy_space(), &downloader, &UnavailableConverter)
        .expect("open");

    store.load(LoadRequest::Default).expect("load");

    for attr in Attribute::ALL {
        assert!(store.is_loaded(attr), "{attr} resident");
        assert_eq!(store.state(attr), AttributeState::Loaded);
    }
}

#[test]
fn missing_disk_and_unreachable_mirror_fall_back_to_rebuild() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let publish_root = tempdir().expect("tempdir");
    let fingerprints = publish(&legacy_space(), publish_root.path());
    let space = published(legacy_space(), &fingerprints);

    let http = HttpDownloader::new().expect("http client");
    let mirror_calls = RefCell::new(Vec::new());
    let downloader = |url: &str, dest: &Path| -> Result<(), TransportError> {
        if url.starts_with(MIRROR) {
            mirror_calls.borrow_mut().push(url.to_string());
            return Err(TransportError::new(TransportErrorKind::Connection, "connection refused"));
        }
        http.download(url, dest)
    };

    let root = tempdir().expect("tempdir");
    let mut store = CacheStore::open(config(root.path()), space.clone(), &downloader, &UnavailableConverter)
        .expect("open");
    store
        .load(LoadRequest::only([Attribute::ChebiCompounds]))
        .expect("rebuild after mirror failure");

    assert_eq!(store.state(Attribute::ChebiCompounds), AttributeState::Loaded);
    assert_eq!(
        mirror_calls.borrow().as_slice(),
        [format!("{MIRROR}/chebi_cid.json")]
    );
    let artifacts = ArtifactStore::new(CacheLayout::new(root.path(), SPACE));
    let spec = &space.attribute(Attribute::ChebiCompounds).expect("declared").artifact;
    assert!(artifacts.status(spec).is_valid());
    assert!(CacheLayout::new(root.path(), SPACE)
        .input_path("chem_xref.tsv")
        .is_file());
}

#[test]
fn mirror_installs_verified_artifacts_without_touching_inputs() {
    let publish_root = tempdir().expect("tempdir");
    let fingerprints = publish(&legacy_space(), publish_root.path());
    let space = published(legacy_space(), &fingerprints);
    let source = CacheLayout::new(publish_root.path(), SPACE);

    let downloader = |url: &str, dest: &Path| -> Result<(), TransportError> {
        let Some(file) = url.strip_prefix(&format!("{MIRROR}/")) else {
            return Err(TransportError::new(TransportErrorKind::InvalidUrl, url));
        };
        fs::copy(source.artifact_path(file), dest)
            .map(|_| ())
            .map_err(|e| TransportError::new(TransportErrorKind::NotFound, e.to_string()))
    };

    let root = tempdir().expect("tempdir");
    let mut store = CacheStore::open(config(root.path()), space, &downloader, &UnavailableConverter)
        .expect("open");
    store.load(LoadRequest::Default).expect("mirror load");

    let layout = CacheLayout::new(root.path(), SPACE);
    assert!(!layout.input_dir().exists());
    let sidecar = read_sidecar(&layout.artifact_path("cid_xref.json.gz")).expect("sidecar");
    assert_eq!(Some(&sidecar), fingerprints.get(&Attribute::CompoundXref));
    assert_eq!(
        store.compound_by_chebi("15378"),
        Some("MNXM1")
    );
}

#[test]
fn mismatching_mirror_artifact_is_rejected_and_rebuilt() {
    let publish_root = tempdir().expect("tempdir");
    let fingerprints = publish(&legacy_space(), publish_root.path());
    let space = published(legacy_space(), &fingerprints);

    let http = HttpDownloader::new().expect("http client");
    let downloader = |url: &str, dest: &Path| -> Result<(), TransportError> {
        if url.starts_with(MIRROR) {
            return fs::write(dest, b"{\"tampered\":true}")
                .map_err(|e| TransportError::new(TransportErrorKind::Io, e.to_string()));
        }
        http.download(url, dest)
    };

    let root = tempdir().expect("tempdir");
    let mut store = CacheStore::open(config(root.path()), space.clone(), &downloader, &UnavailableConverter)
        .expect("open");
    store
        .load(LoadRequest::only([Attribute::DeprecatedReactionIds]))
        .expect("rebuild");

    let artifacts = ArtifactStore::new(CacheLayout::new(root.path(), SPACE));
    let spec = &space.attribute(Attribute::DeprecatedReactionIds).expect("declared").artifact;
    assert!(artifacts.status(spec).is_valid());
    assert_eq!(store.resolve_reaction_id("MNXR01"), "MNXR10");
}

#[test]
fn corrupted_artifact_is_rebuilt_on_next_load() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let space = legacy_space();
    let path = CacheLayout::new(root.path(), SPACE).artifact_path("cid_xref.json.gz");

    {
        let mut store = CacheStore::open(config(root.path()), space.clone(), &downloader, &UnavailableConverter)
            .expect("open");
        store
            .load(LoadRequest::only([Attribute::CompoundXref]))
            .expect("first load");
    }
    let original = fs::read(&path).expect("artifact");
    flip_last_byte(&path);

    let mut store = CacheStore::open(config(root.path()), space, &downloader, &UnavailableConverter)
        .expect("open");
    store
        .load(LoadRequest::only([Attribute::CompoundXref]))
        .expect("second load");

    assert_eq!(fs::read(&path).expect("artifact"), original);
    assert_eq!(store.state(Attribute::CompoundXref), AttributeState::Loaded);
}

#[test]
fn missing_inputs_surface_as_load_errors() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let space = support::space_with_url("");
    let mut store = CacheStore::open(config(root.path()), space, &downloader, &UnavailableConverter)
        .expect("open");

    let err = store
        .load(LoadRequest::only([Attribute::CompoundXref]))
        .expect_err("no source url");
    assert_eq!(err.as_error_code(), ErrorCode::MissingSource);
    assert!(matches!(
        store.state(Attribute::CompoundXref),
        AttributeState::Error(_)
    ));
}

#[test]
fn undeclared_attribute_is_rejected() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let mut space = legacy_space();
    space.attributes.retain(|a| a.name != Attribute::RuleReactions);
    let mut store = CacheStore::open(config(root.path()), space, &downloader, &UnavailableConverter)
        .expect("open");

    let err = store
        .load(LoadRequest::only([Attribute::RuleReactions]))
        .expect_err("undeclared");
    assert_eq!(err.as_error_code(), ErrorCode::ConfigInvalid);
    assert!(store.get(Attribute::RuleReactions).is_none());
}
