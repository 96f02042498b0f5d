//! Transport and pipeline error types.

use pinseal_crypto::CryptoError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised around the crypto core: files, HTTP, JSON, configuration.
///
/// Crypto failures pass through unchanged, so decryption failures still
/// render only as "decryption failed".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} exceeds limit: {size} > {limit} bytes")]
    TooLarge {
        what: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("insecure URL refused: {0}")]
    InsecureUrl(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl TransportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
