//! Envelope encoder: wraps a fresh content-encryption key for the recipient
//! with RSA-OAEP-256 and encrypts the payload under it.

use crate::content::ContentEncryption;
use crate::envelope::CompactEnvelope;
use crate::error::{CryptoError, CryptoResult};
use crate::header::ProtectedHeader;
use crate::key::PublicKey;
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};
use rsa::Oaep;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

/// Seals payloads into compact envelopes.
///
/// Every call draws a new content-encryption key and IV, so sealing the same
/// payload twice never yields the same token. All randomness goes through
/// fallible APIs: an exhausted or broken entropy source surfaces as
/// [`CryptoError::RandomnessUnavailable`] instead of a panic.
pub struct EnvelopeEncryptor<R = OsRng> {
    rng: R,
    enc: ContentEncryption,
}

impl EnvelopeEncryptor<OsRng> {
    /// Encryptor backed by the operating system CSPRNG, sealing with `A256GCM`.
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for EnvelopeEncryptor<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> EnvelopeEncryptor<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            enc: ContentEncryption::default(),
        }
    }

    /// Selects the content encryption algorithm written to the header.
    pub fn content_encryption(mut self, enc: ContentEncryption) -> Self {
        self.enc = enc;
        self
    }

    /// Seals `plaintext` for `recipient`.
    pub fn encrypt(
        &mut self,
        plaintext: &[u8],
        recipient: &PublicKey,
    ) -> CryptoResult<CompactEnvelope> {
        let enc = self.enc;

        let mut cek = Zeroizing::new(vec![0u8; enc.key_size()]);
        self.fill(&mut cek)?;
        let mut iv = vec![0u8; enc.iv_size()];
        self.fill(&mut iv)?;

        let mut oaep_rng = StdRng::from_rng(&mut self.rng)
            .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
        let encrypted_key = recipient
            .rsa()
            .encrypt(&mut oaep_rng, Oaep::new::<Sha256>(), &cek)
            .map_err(|e| CryptoError::Encryption(format!("RSA-OAEP key wrap failed: {e}")))?;

        let header = ProtectedHeader::new(enc, recipient.key_id());
        let encoded_header = header.encode()?;
        let (ciphertext, tag) = enc.seal(&cek, &iv, encoded_header.as_bytes(), plaintext)?;

        debug!(
            enc = enc.name(),
            modulus_bits = recipient.modulus_bits(),
            plaintext_len = plaintext.len(),
            "sealed envelope"
        );

        Ok(CompactEnvelope::new(
            header,
            encoded_header,
            encrypted_key,
            iv,
            ciphertext,
            tag,
        ))
    }

    fn fill(&mut self, buf: &mut [u8]) -> CryptoResult<()> {
        self.rng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))
    }
}

/// Seals `plaintext` for `recipient` with the default settings.
pub fn encrypt(plaintext: &[u8], recipient: &PublicKey) -> CryptoResult<CompactEnvelope> {
    EnvelopeEncryptor::new().encrypt(plaintext, recipient)
}
