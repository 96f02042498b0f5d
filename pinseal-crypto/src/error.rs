//! Error types for envelope encryption.

use thiserror::Error;

/// Result type for envelope operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while loading keys or sealing/opening envelopes.
///
/// Every variant is terminal for the operation that raised it. `KeyUnwrap` and
/// `Authentication` render identically; use [`kind`] to tell them apart in
/// internal diagnostics.
///
/// [`kind`]: CryptoError::kind
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key format: {0}")]
    KeyFormat(String),

    #[error("unexpected key type: {0}")]
    KeyType(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("decryption failed")]
    KeyUnwrap,

    #[error("decryption failed")]
    Authentication,
}

impl CryptoError {
    /// Stable diagnostic label for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyFormat(_) => "key_format",
            Self::KeyType(_) => "key_type",
            Self::Encryption(_) => "encryption",
            Self::RandomnessUnavailable(_) => "randomness_unavailable",
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::KeyUnwrap => "key_unwrap",
            Self::Authentication => "authentication",
        }
    }

    /// Returns true for the failures that must look identical to outsiders.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::KeyUnwrap | Self::Authentication)
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEnvelope(msg.into())
    }
}
