//! Confidential distribution of pinning configuration.
//!
//! A publisher seals a small JSON document for one recipient; the recipient
//! fetches the sealed token and opens it with its private key. The token is a
//! JWE compact serialization with pinned algorithms:
//!
//! - **Key management**: `RSA-OAEP-256` (OAEP, SHA-256 digest and MGF1-SHA-256).
//!   Nothing else is accepted, whatever the header claims.
//! - **Content encryption**: `A256GCM` by default; `A128CBC-HS256` is also
//!   supported for tokens produced by JOSE libraries that default to it.
//!
//! # Architecture
//!
//! - [`key`]: loads RSA keys from PEM or JWK into typed public/private handles.
//! - [`encoder`]: fresh CEK + IV per call, OAEP key wrap, authenticated encryption.
//! - [`decoder`]: parse, algorithm check, key unwrap, tag verification. No
//!   plaintext is released unless the tag verifies.
//!
//! All operations are synchronous and free of shared state; callers own their
//! keys and pass them explicitly.

pub mod content;
pub mod decoder;
pub mod encoder;
pub mod envelope;
mod error;
pub mod header;
pub mod key;

pub use content::{CEK_SIZE, ContentEncryption, TAG_SIZE};
pub use decoder::{decrypt, decrypt_envelope};
pub use encoder::{EnvelopeEncryptor, encrypt};
pub use envelope::{CompactEnvelope, SEGMENT_COUNT};
pub use error::{CryptoError, CryptoResult};
pub use header::{KEY_WRAP_ALG, ProtectedHeader};
pub use key::{KeyFormat, PrivateKey, PublicKey, load_private_key, load_public_key};
