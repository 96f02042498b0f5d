//! Publisher and consumer pipelines around the envelope core.
//!
//! Publisher: JSON file + public key -> sealed token file.
//! Consumer: token file or HTTPS URL + private key -> JSON document.
//!
//! Pin documents are opaque here; they are only required to be JSON.

use crate::config::PinsealConfig;
use crate::error::{TransportError, TransportResult};
use crate::fetch::TokenFetcher;
use crate::files::{read_bounded, require_files, write_atomic};
use pinseal_crypto::{
    ContentEncryption, EnvelopeEncryptor, KeyFormat, PrivateKey, PublicKey, decrypt,
    load_private_key, load_public_key,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Key files larger than this are not keys.
const MAX_KEY_BYTES: u64 = 64 * 1024;

/// Outcome of a successful seal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealSummary {
    pub output_path: PathBuf,
    pub token_len: usize,
    pub content_encryption: ContentEncryption,
}

pub fn load_public_key_file(path: &Path, format: KeyFormat) -> TransportResult<PublicKey> {
    let bytes = read_bounded(path, MAX_KEY_BYTES, "key file")?;
    Ok(load_public_key(&bytes, format)?)
}

pub fn load_private_key_file(path: &Path, format: KeyFormat) -> TransportResult<PrivateKey> {
    let bytes = read_bounded(path, MAX_KEY_BYTES, "key file")?;
    Ok(load_private_key(&bytes, format)?)
}

/// Validates `json`, re-serializes it compactly, and seals it.
pub fn seal_json(
    json: &[u8],
    recipient: &PublicKey,
    enc: ContentEncryption,
) -> TransportResult<String> {
    let document: Value = serde_json::from_slice(json)?;
    let compact = serde_json::to_vec(&document)?;
    let envelope = EnvelopeEncryptor::new()
        .content_encryption(enc)
        .encrypt(&compact, recipient)?;
    Ok(envelope.to_compact())
}

/// Opens a token and parses the plaintext as JSON. Surrounding whitespace
/// (such as a trailing newline in a stored token) is ignored.
pub fn open_json(token: &[u8], recipient: &PrivateKey) -> TransportResult<Value> {
    let plaintext = decrypt(token.trim_ascii(), recipient)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Seals `config.input_path` for `config.public_key_path` into `config.output_path`.
pub fn seal_json_file(config: &PinsealConfig) -> TransportResult<SealSummary> {
    require_files(&[config.input_path.as_path(), config.public_key_path.as_path()])?;

    let format = config.key_format_for(&config.public_key_path);
    let recipient = load_public_key_file(&config.public_key_path, format)?;
    let json = read_bounded(&config.input_path, config.max_plaintext_bytes, "pin document")?;

    let token = seal_json(&json, &recipient, config.content_encryption)?;
    write_atomic(&config.output_path, token.as_bytes())?;

    info!(
        output = %config.output_path.display(),
        enc = config.content_encryption.name(),
        "sealed pin document"
    );
    Ok(SealSummary {
        output_path: config.output_path.clone(),
        token_len: token.len(),
        content_encryption: config.content_encryption,
    })
}

/// Opens a token stored at `token_path`.
pub fn open_token_file(config: &PinsealConfig, token_path: &Path) -> TransportResult<Value> {
    let recipient = configured_private_key(config)?;
    let token = read_bounded(token_path, config.max_token_bytes, "token")?;
    open_json(&token, &recipient).inspect_err(log_open_failure)
}

/// Fetches the token at `config.remote_url` and opens it.
pub async fn fetch_and_open(config: &PinsealConfig) -> TransportResult<Value> {
    let url = config
        .remote_url
        .as_deref()
        .ok_or_else(|| TransportError::Config("remote_url is not set".to_string()))?;
    let recipient = configured_private_key(config)?;

    let token = TokenFetcher::new(config)?.fetch(url).await?;
    let document = open_json(&token, &recipient).inspect_err(log_open_failure)?;
    info!(url, "opened remote pin document");
    Ok(document)
}

fn configured_private_key(config: &PinsealConfig) -> TransportResult<PrivateKey> {
    let path = config
        .private_key_path
        .as_deref()
        .ok_or_else(|| TransportError::Config("private_key_path is not set".to_string()))?;
    load_private_key_file(path, config.key_format_for(path))
}

fn log_open_failure(err: &TransportError) {
    if let TransportError::Crypto(e) = err {
        warn!(kind = e.kind(), "sealed pin document rejected");
    }
}
