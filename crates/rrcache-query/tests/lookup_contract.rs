// SPDX-License-Identifier: Apache-2.0

mod support;

use std::path::Path;

use rrcache_ingest::UnavailableConverter;
use rrcache_model::Attribute;
use rrcache_query::{AttributeState, CacheStore, CacheStoreConfig, LoadRequest};
use rrcache_store::HttpDownloader;
use tempfile::tempdir;

use support::{copy_inputs, legacy_space, space_with_url};

fn config(root: &Path) -> CacheStoreConfig {
    CacheStoreConfig {
        root: root.to_path_buf(),
        allow_download: false,
    }
}

#[test]
fn lookups_load_only_the_attribute_they_read() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let mut store = CacheStore::open(config(root.path()), legacy_space(), &downloader, &UnavailableConverter)
        .expect("open");

    let water = store.get_compound("MNXM2").cloned().expect("water");
    assert_eq!(water.inchikey.as_deref(), Some("XLYOFNOQVPJJNP-UHFFFAOYSA-N"));
    assert!(store.is_loaded(Attribute::CompoundStructures));
    assert!(!store.is_loaded(Attribute::RuleReactions));
    assert!(!store.is_loaded(Attribute::TemplateReactions));

    let alias = store.get_reaction("MNXR01").cloned().expect("deprecated alias");
    let current = store.get_reaction("MNXR10").cloned().expect("current reaction");
    assert_eq!(alias, current);
    assert!(store.get_reaction("MNXR12").is_none());

    let links = store.get_reaction_rule("RR-02-a").expect("rule");
    assert!(links.contains_key("MNXR10"));
    assert_eq!(
        store.list_reaction_rules().expect("rules"),
        vec!["RR-02-a", "RR-02-b"]
    );
    assert!(store
        .list_compounds()
        .expect("compounds")
        .contains(&"MNXM6"));
    assert!(store
        .list_reactions()
        .expect("reactions")
        .contains(&"MNXR01"));
    assert!(store.get_compound("MNXM404").is_none());
}

#[test]
fn id_resolution_and_secondary_indexes() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let mut store = CacheStore::open(config(root.path()), legacy_space(), &downloader, &UnavailableConverter)
        .expect("open");

    assert_eq!(store.resolve_compound_id("MNXM1234"), "MNXM2");
    assert_eq!(store.resolve_compound_id("MNXM2"), "MNXM2");
    assert_eq!(store.resolve_compound_id("MNXM99"), "MNXM5");
    assert_eq!(store.resolve_reaction_id("MNXR01"), "MNXR10");
    assert_eq!(store.resolve_reaction_id("MNXR77"), "MNXR77");
    assert_eq!(store.resolve_compartment_id("c0"), Some("MNXC3"));
    assert_eq!(store.compound_by_chebi("15377"), Some("MNXM2"));
    assert_eq!(store.compound_by_chebi("0"), None);
    assert_eq!(
        store.compounds_by_inchikey("QTBSBXVTEAMEQO-UHFFFAOYSA-M"),
        Some(&["MNXM3".to_string(), "MNXM6".to_string()][..])
    );
}

#[test]
fn failed_lazy_load_is_not_retried_until_explicit_load() {
    let root = tempdir().expect("tempdir");
    let downloader = HttpDownloader::new().expect("http client");
    let mut store = CacheStore::open(config(root.path()), space_with_url(""), &downloader, &UnavailableConverter)
        .expect("open");

    assert!(store.get_compound("MNXM2").is_none());
    assert!(matches!(
        store.state(Attribute::CompoundStructures),
        AttributeState::Error(_)
    ));

    copy_inputs(root.path());
    assert!(store.get_compound("MNXM2").is_none());

    store
        .load(LoadRequest::only([Attribute::CompoundStructures]))
        .expect("explicit retry");
    assert_eq!(store.state(Attribute::CompoundStructures), AttributeState::Loaded);
    assert!(store.get_compound("MNXM2").is_some());
    assert!(store.get(Attribute::CompoundNames).is_some());
}
