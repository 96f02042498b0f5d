//! Shared fixtures for integration tests.
//!
//! Keys and the `token_*.jwe` files under `tests/fixtures/` were produced by
//! an independent JWE implementation, so decrypting them checks wire
//! compatibility rather than self-consistency.

#![allow(dead_code)]

use pinseal_crypto::{KeyFormat, PrivateKey, PublicKey, load_private_key, load_public_key};
use std::path::{Path, PathBuf};

/// The pin document used throughout the tests.
pub const PINS_JSON: &[u8] = br#"{"pins":["AA==","BB=="]}"#;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("fixture must exist")
}

pub fn public_key() -> PublicKey {
    load_public_key(&fixture("rsa2048_public.pem"), KeyFormat::Pem).expect("valid public key")
}

pub fn private_key() -> PrivateKey {
    load_private_key(&fixture("rsa2048_private.pem"), KeyFormat::Pem).expect("valid private key")
}

/// A second, unrelated key pair.
pub fn other_private_key() -> PrivateKey {
    load_private_key(&fixture("rsa2048_other_private.pem"), KeyFormat::Pem)
        .expect("valid private key")
}

pub fn other_public_key() -> PublicKey {
    load_public_key(&fixture("rsa2048_other_public.pem"), KeyFormat::Pem)
        .expect("valid public key")
}
