// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rrcache_core::Fingerprint;
use rrcache_ingest::{CacheBuilder, UnavailableConverter};
use rrcache_model::{Attribute, CacheConfig, ChemicalSpace};
use rrcache_store::{CacheLayout, HttpDownloader};

pub const SPACE: &str = "tiny";
pub const MIRROR: &str = "https://mirror.invalid/rrcache/tiny";

/// Raw tables shared with the ingest crate's tests.
pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../rrcache-ingest/tests/fixtures/tiny")
}

pub fn space_with_url(url: &str) -> ChemicalSpace {
    let doc = include_str!("../fixtures/tiny_space.toml").replace("@URL@", url);
    let cfg = CacheConfig::from_toml_str(&doc).expect("config");
    cfg.default_space().expect("space").clone()
}

pub fn legacy_space() -> ChemicalSpace {
    space_with_url(&format!("file://{}/", fixture_dir().display()))
}

/// Registers `fingerprints` and the mirror on `space`.
pub fn published(mut space: ChemicalSpace, fingerprints: &BTreeMap<Attribute, Fingerprint>) -> ChemicalSpace {
    space.mirror_url = Some(MIRROR.to_string());
    for spec in &mut space.attributes {
        spec.artifact.fingerprint = fingerprints.get(&spec.name).copied();
    }
    space
}

/// Builds every attribute under `root` and returns the artifact fingerprints.
pub fn publish(space: &ChemicalSpace, root: &Path) -> BTreeMap<Attribute, Fingerprint> {
    let downloader = HttpDownloader::new().expect("http client");
    let builder = CacheBuilder::new(space, root, &downloader, &UnavailableConverter).expect("builder");
    let all = space.declared_attributes().into_iter().collect();
    builder.build(&all).expect("publish build").fingerprints
}

pub fn copy_inputs(root: &Path) {
    let dir = CacheLayout::new(root, SPACE).input_dir();
    fs::create_dir_all(&dir).expect("input dir");
    for entry in fs::read_dir(fixture_dir()).expect("fixtures") {
        let entry = entry.expect("entry");
        fs::copy(entry.path(), dir.join(entry.file_name())).expect("copy input");
    }
}

pub fn flip_last_byte(path: &Path) {
    let mut bytes = fs::read(path).expect("artifact");
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(path, bytes).expect("tamper");
}
