//! Envelope decoder.
//!
//! Steps, each with its own failure exit:
//! 1. split into five segments and base64url-decode them (`MalformedEnvelope`)
//! 2. check the header against the pinned algorithms (`UnsupportedAlgorithm`)
//! 3. unwrap the content-encryption key with RSA-OAEP-256 (`KeyUnwrap`)
//! 4. verify the tag and decrypt (`Authentication`)
//!
//! The OAEP unwrap reports one opaque error for every failure cause and the
//! RSA operation is blinded.

use crate::content::TAG_SIZE;
use crate::envelope::CompactEnvelope;
use crate::error::{CryptoError, CryptoResult};
use crate::key::PrivateKey;
use rand::SeedableRng;
use rand::rngs::{OsRng, StdRng};
use rsa::Oaep;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

/// Opens a compact token and returns the plaintext.
pub fn decrypt(token: &[u8], recipient: &PrivateKey) -> CryptoResult<Vec<u8>> {
    let envelope = CompactEnvelope::parse(token).inspect_err(log_rejection)?;
    decrypt_envelope(&envelope, recipient)
}

/// Opens an already parsed envelope.
pub fn decrypt_envelope(envelope: &CompactEnvelope, recipient: &PrivateKey) -> CryptoResult<Vec<u8>> {
    open(envelope, recipient).inspect_err(log_rejection)
}

fn open(envelope: &CompactEnvelope, recipient: &PrivateKey) -> CryptoResult<Vec<u8>> {
    let enc = envelope.header().validate()?;
    if envelope.iv().len() != enc.iv_size() {
        return Err(CryptoError::malformed(format!(
            "{enc} requires a {}-byte IV, found {}",
            enc.iv_size(),
            envelope.iv().len()
        )));
    }
    if envelope.tag().len() != TAG_SIZE {
        return Err(CryptoError::malformed(format!(
            "authentication tag must be {TAG_SIZE} bytes, found {}",
            envelope.tag().len()
        )));
    }

    let mut blinding = StdRng::from_rng(OsRng)
        .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
    let cek = Zeroizing::new(
        recipient
            .rsa()
            .decrypt_blinded(&mut blinding, Oaep::new::<Sha256>(), envelope.encrypted_key())
            .map_err(|_| CryptoError::KeyUnwrap)?,
    );
    if cek.len() != enc.key_size() {
        return Err(CryptoError::KeyUnwrap);
    }

    enc.open(
        &cek,
        envelope.iv(),
        envelope.encoded_header().as_bytes(),
        envelope.ciphertext(),
        envelope.tag(),
    )
}

fn log_rejection(err: &CryptoError) {
    debug!(kind = err.kind(), "envelope rejected");
}
