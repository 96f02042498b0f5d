//! Publisher/consumer configuration.

use crate::error::{TransportError, TransportResult};
use pinseal_crypto::{ContentEncryption, KeyFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for sealing and opening pin documents.
///
/// Every field has a default, so a config file only needs the values it
/// changes. Command-line flags override whatever is loaded here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinsealConfig {
    /// Plain JSON pin document to seal.
    pub input_path: PathBuf,

    /// Recipient public key (PEM or JWK).
    pub public_key_path: PathBuf,

    /// Where the sealed token is written.
    pub output_path: PathBuf,

    /// Private key used by consumers to open tokens.
    pub private_key_path: Option<PathBuf>,

    /// Key encoding; inferred from the key file extension when unset.
    pub key_format: Option<KeyFormat>,

    pub content_encryption: ContentEncryption,

    /// HTTPS location of the published token.
    pub remote_url: Option<String>,

    pub request_timeout_secs: u64,

    /// Largest token accepted from disk or network.
    pub max_token_bytes: u64,

    /// Largest pin document accepted for sealing.
    pub max_plaintext_bytes: u64,

    /// Permit `http://` URLs. Only meant for local testing.
    pub allow_insecure_http: bool,
}

impl Default for PinsealConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("ssl-pinning-config.json"),
            public_key_path: PathBuf::from("ssl-public.pem"),
            output_path: PathBuf::from("ssl-pinning"),
            private_key_path: None,
            key_format: None,
            content_encryption: ContentEncryption::A256Gcm,
            remote_url: None,
            request_timeout_secs: 30,
            max_token_bytes: 64 * 1024,
            max_plaintext_bytes: 1024 * 1024,
            allow_insecure_http: false,
        }
    }
}

impl PinsealConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> TransportResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| TransportError::io(path, e))?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(TransportError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_token_bytes == 0 || self.max_plaintext_bytes == 0 {
            return Err(TransportError::Config("size limits must be positive".to_string()));
        }
        if let Some(url) = &self.remote_url {
            check_url(url, self.allow_insecure_http)?;
        }
        Ok(())
    }

    /// Key encoding for `path`: the configured format, else inferred.
    pub fn key_format_for(&self, path: &Path) -> KeyFormat {
        self.key_format.unwrap_or_else(|| KeyFormat::from_path(path))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parses `url` and refuses anything but HTTPS unless `allow_http` is set.
pub(crate) fn check_url(url: &str, allow_http: bool) -> TransportResult<reqwest::Url> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| TransportError::Config(format!("invalid URL `{url}`: {e}")))?;
    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if allow_http => Ok(parsed),
        _ => Err(TransportError::InsecureUrl(url.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_is_always_accepted() {
        assert!(check_url("https://cdn.example.com/ssl-pinning", false).is_ok());
    }

    #[test]
    fn http_needs_opt_in() {
        assert!(matches!(
            check_url("http://127.0.0.1:8080/ssl-pinning", false),
            Err(TransportError::InsecureUrl(_))
        ));
        assert!(check_url("http://127.0.0.1:8080/ssl-pinning", true).is_ok());
    }

    #[test]
    fn other_schemes_are_refused() {
        assert!(matches!(
            check_url("file:///etc/passwd", true),
            Err(TransportError::InsecureUrl(_))
        ));
        assert!(matches!(check_url("not a url", true), Err(TransportError::Config(_))));
    }
}
