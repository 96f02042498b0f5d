//! Shared helpers for transport integration tests.
//!
//! Key material and foreign tokens live with the crypto crate's fixtures.

#![allow(dead_code)]

use pinseal_transport::PinsealConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PINS_JSON: &str = r#"{"pins":["AA==","BB=="]}"#;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("pinseal-crypto")
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("fixture must exist")
}

/// A config rooted in a fresh temp dir, with the pin document written and
/// the fixture key pair wired in.
pub fn workspace(pins: &str) -> (TempDir, PinsealConfig) {
    let dir = tempfile::tempdir().expect("temp dir");
    let input_path = dir.path().join("ssl-pinning-config.json");
    std::fs::write(&input_path, pins).expect("write pin document");

    let config = PinsealConfig {
        input_path,
        public_key_path: fixture_path("rsa2048_public.pem"),
        output_path: dir.path().join("ssl-pinning"),
        private_key_path: Some(fixture_path("rsa2048_private.pem")),
        ..PinsealConfig::default()
    };
    (dir, config)
}
