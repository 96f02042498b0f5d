//! Content encryption algorithms (`enc` header values, RFC 7518 §5).
//!
//! - `A256GCM`: AES-256-GCM, 96-bit IV, 128-bit tag.
//! - `A128CBC-HS256`: AES-128-CBC with PKCS#7 padding, authenticated by
//!   HMAC-SHA-256 truncated to 128 bits. The 32-byte key is split into a MAC
//!   half and an encryption half.

use crate::error::{CryptoError, CryptoResult};
use aes::Aes128;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::Aes256Gcm;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

/// Content-encryption key size for every supported algorithm.
pub const CEK_SIZE: usize = 32;

/// Authentication tag size for every supported algorithm.
pub const TAG_SIZE: usize = 16;

const GCM_IV_SIZE: usize = 12;
const CBC_IV_SIZE: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Authenticated symmetric cipher protecting the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentEncryption {
    #[default]
    #[serde(rename = "A256GCM")]
    A256Gcm,
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,
}

impl ContentEncryption {
    /// The `enc` header value.
    pub fn name(&self) -> &'static str {
        match self {
            Self::A256Gcm => "A256GCM",
            Self::A128CbcHs256 => "A128CBC-HS256",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A256GCM" => Some(Self::A256Gcm),
            "A128CBC-HS256" => Some(Self::A128CbcHs256),
            _ => None,
        }
    }

    pub fn key_size(&self) -> usize {
        CEK_SIZE
    }

    pub fn iv_size(&self) -> usize {
        match self {
            Self::A256Gcm => GCM_IV_SIZE,
            Self::A128CbcHs256 => CBC_IV_SIZE,
        }
    }

    /// Encrypts `plaintext`, returning `(ciphertext, tag)`.
    pub(crate) fn seal(
        &self,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        self.check_sizes(cek, iv).map_err(CryptoError::Encryption)?;
        match self {
            Self::A256Gcm => gcm_seal(cek, iv, aad, plaintext),
            Self::A128CbcHs256 => cbc_hs_seal(cek, iv, aad, plaintext),
        }
    }

    /// Verifies `tag` and decrypts `ciphertext`. Nothing is returned unless
    /// the tag verifies.
    pub(crate) fn open(
        &self,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        if cek.len() != CEK_SIZE {
            return Err(CryptoError::KeyUnwrap);
        }
        if iv.len() != self.iv_size() || tag.len() != TAG_SIZE {
            return Err(CryptoError::malformed(format!(
                "{} requires a {}-byte IV and a {TAG_SIZE}-byte tag",
                self.name(),
                self.iv_size()
            )));
        }
        match self {
            Self::A256Gcm => gcm_open(cek, iv, aad, ciphertext, tag),
            Self::A128CbcHs256 => cbc_hs_open(cek, iv, aad, ciphertext, tag),
        }
    }

    fn check_sizes(&self, cek: &[u8], iv: &[u8]) -> Result<(), String> {
        if cek.len() != CEK_SIZE {
            return Err(format!("{} requires a {CEK_SIZE}-byte key", self.name()));
        }
        if iv.len() != self.iv_size() {
            return Err(format!("{} requires a {}-byte IV", self.name(), self.iv_size()));
        }
        Ok(())
    }
}

impl FromStr for ContentEncryption {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            CryptoError::UnsupportedAlgorithm(format!("content encryption `{s}`"))
        })
    }
}

impl fmt::Display for ContentEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn gcm_seal(cek: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(cek)
        .map_err(|e| CryptoError::Encryption(format!("AES-256-GCM key rejected: {e}")))?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(iv), aad, &mut buffer)
        .map_err(|e| CryptoError::Encryption(format!("AES-256-GCM seal failed: {e}")))?;
    Ok((buffer, tag.to_vec()))
}

fn gcm_open(cek: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(cek).map_err(|_| CryptoError::KeyUnwrap)?;
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(iv),
            aad,
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CryptoError::Authentication)?;
    Ok(buffer)
}

fn cbc_hs_seal(cek: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
    let (mac_key, enc_key) = cek.split_at(CEK_SIZE / 2);
    let ciphertext = Aes128CbcEnc::new_from_slices(enc_key, iv)
        .map_err(|e| CryptoError::Encryption(format!("AES-128-CBC key rejected: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mac = cbc_hs_mac(mac_key, aad, iv, &ciphertext)
        .map_err(|e| CryptoError::Encryption(format!("HMAC key rejected: {e}")))?;
    let tag = mac.finalize().into_bytes()[..TAG_SIZE].to_vec();
    Ok((ciphertext, tag))
}

fn cbc_hs_open(cek: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> CryptoResult<Vec<u8>> {
    let (mac_key, enc_key) = cek.split_at(CEK_SIZE / 2);

    // MAC first: padding errors must be unreachable for forged ciphertexts.
    cbc_hs_mac(mac_key, aad, iv, ciphertext)
        .map_err(|_| CryptoError::KeyUnwrap)?
        .verify_truncated_left(tag)
        .map_err(|_| CryptoError::Authentication)?;

    Aes128CbcDec::new_from_slices(enc_key, iv)
        .map_err(|_| CryptoError::KeyUnwrap)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Authentication)
}

/// HMAC over `AAD || IV || ciphertext || AL`, where AL is the AAD length in
/// bits as a 64-bit big-endian integer.
fn cbc_hs_mac(
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<HmacSha256, hmac::digest::InvalidLength> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&((aad.len() as u64) * 8).to_be_bytes());
    Ok(mac)
}
