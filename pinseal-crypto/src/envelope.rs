//! Compact envelope serialization.
//!
//! Wire format: five base64url (unpadded) segments joined by `.`:
//!
//! ```text
//! BASE64URL(header) . BASE64URL(encrypted_key) . BASE64URL(iv) . BASE64URL(ciphertext) . BASE64URL(tag)
//! ```
//!
//! The header segment is kept verbatim because its ASCII bytes are the
//! additional authenticated data for the content cipher.

use crate::error::{CryptoError, CryptoResult};
use crate::header::ProtectedHeader;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fmt;

/// Number of `.`-separated segments in a compact token.
pub const SEGMENT_COUNT: usize = 5;

/// A parsed or freshly sealed compact envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactEnvelope {
    header: ProtectedHeader,
    encoded_header: String,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl CompactEnvelope {
    pub(crate) fn new(
        header: ProtectedHeader,
        encoded_header: String,
        encrypted_key: Vec<u8>,
        iv: Vec<u8>,
        ciphertext: Vec<u8>,
        tag: Vec<u8>,
    ) -> Self {
        Self {
            header,
            encoded_header,
            encrypted_key,
            iv,
            ciphertext,
            tag,
        }
    }

    /// Splits and decodes a compact token. No cryptographic work happens here.
    pub fn parse(token: &[u8]) -> CryptoResult<Self> {
        let token = std::str::from_utf8(token)
            .ok()
            .filter(|t| t.is_ascii())
            .ok_or_else(|| CryptoError::malformed("token is not ASCII text"))?;
        if token.is_empty() {
            return Err(CryptoError::malformed("token is empty"));
        }

        let segments: Vec<&str> = token.split('.').collect();
        let [header, encrypted_key, iv, ciphertext, tag] = segments.as_slice() else {
            return Err(CryptoError::malformed(format!(
                "expected {SEGMENT_COUNT} segments, found {}",
                segments.len()
            )));
        };

        Ok(Self {
            header: ProtectedHeader::decode(header)?,
            encoded_header: (*header).to_string(),
            encrypted_key: decode_segment("encrypted key", encrypted_key)?,
            iv: decode_segment("initialization vector", iv)?,
            ciphertext: decode_segment("ciphertext", ciphertext)?,
            tag: decode_segment("authentication tag", tag)?,
        })
    }

    /// Serializes to the compact `a.b.c.d.e` form.
    pub fn to_compact(&self) -> String {
        [
            self.encoded_header.clone(),
            URL_SAFE_NO_PAD.encode(&self.encrypted_key),
            URL_SAFE_NO_PAD.encode(&self.iv),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
            URL_SAFE_NO_PAD.encode(&self.tag),
        ]
        .join(".")
    }

    pub fn header(&self) -> &ProtectedHeader {
        &self.header
    }

    /// The header segment exactly as transmitted.
    pub fn encoded_header(&self) -> &str {
        &self.encoded_header
    }

    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}

impl fmt::Display for CompactEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}

fn decode_segment(name: &str, segment: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| CryptoError::malformed(format!("{name} is not base64url: {e}")))
}
