//! RSA key loading from PEM and JSON Web Key encodings.
//!
//! Public and private keys are separate types so the encoder can only ever be
//! handed a public key and the decoder a private one. Key identity is the RSA
//! material alone, so a PEM and a JWK encoding of one key compare equal.

use crate::error::{CryptoError, CryptoResult};
use crate::header::KEY_WRAP_ALG;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, spki};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Source encoding of key material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    #[default]
    Pem,
    Jwk,
}

impl KeyFormat {
    /// Guesses the encoding from a file name: `.json` and `.jwk` are JWK,
    /// everything else is treated as PEM.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("jwk") => {
                Self::Jwk
            }
            _ => Self::Pem,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pem => "pem",
            Self::Jwk => "jwk",
        }
    }
}

impl FromStr for KeyFormat {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pem") {
            Ok(Self::Pem)
        } else if s.eq_ignore_ascii_case("jwk") {
            Ok(Self::Jwk)
        } else {
            Err(CryptoError::KeyFormat(format!("unknown key format `{s}`")))
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recipient public key used to wrap content-encryption keys.
#[derive(Clone, Debug)]
pub struct PublicKey {
    inner: RsaPublicKey,
    kid: Option<String>,
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for PublicKey {}

impl PublicKey {
    /// Parses a `PUBLIC KEY` (SPKI) or `RSA PUBLIC KEY` (PKCS#1) PEM document.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let pem = pem.trim_start();
        let inner = match pem_label(pem) {
            Some("PUBLIC KEY") => RsaPublicKey::from_public_key_pem(pem).map_err(spki_error)?,
            Some("RSA PUBLIC KEY") => RsaPublicKey::from_pkcs1_pem(pem)
                .map_err(|e| CryptoError::KeyFormat(format!("invalid PKCS#1 public key: {e}")))?,
            Some(label) if is_private_label(label) => {
                return Err(CryptoError::KeyType(
                    "private key supplied where a public key is required".to_string(),
                ));
            }
            Some(label) => {
                return Err(CryptoError::KeyFormat(format!("unsupported PEM label `{label}`")));
            }
            None => return Err(CryptoError::KeyFormat("no PEM boundary found".to_string())),
        };
        Ok(Self { inner, kid: None })
    }

    /// Parses an RSA public JSON Web Key.
    pub fn from_jwk(json: &str) -> CryptoResult<Self> {
        let jwk = RsaJwk::parse(json)?;
        if jwk.d.is_some() {
            return Err(CryptoError::KeyType(
                "private key supplied where a public key is required".to_string(),
            ));
        }
        let inner = RsaPublicKey::new(jwk.modulus()?, jwk.exponent()?)
            .map_err(|e| CryptoError::KeyFormat(format!("invalid RSA public key: {e}")))?;
        Ok(Self { inner, kid: jwk.kid.clone() })
    }

    /// Key identifier carried by the source JWK, if any.
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Modulus size in bits.
    pub fn modulus_bits(&self) -> usize {
        self.inner.size() * 8
    }

    pub(crate) fn rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

/// Recipient private key used to unwrap content-encryption keys.
///
/// The underlying RSA key zeroizes its components on drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
    kid: Option<String>,
}

impl PrivateKey {
    /// Parses a `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY` (PKCS#1) PEM document.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let pem = pem.trim_start();
        let inner = match pem_label(pem) {
            Some("PRIVATE KEY") => RsaPrivateKey::from_pkcs8_pem(pem).map_err(pkcs8_error)?,
            Some("RSA PRIVATE KEY") => RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| CryptoError::KeyFormat(format!("invalid PKCS#1 private key: {e}")))?,
            Some("ENCRYPTED PRIVATE KEY") => {
                return Err(CryptoError::KeyFormat(
                    "passphrase-protected private keys are not supported".to_string(),
                ));
            }
            Some("PUBLIC KEY" | "RSA PUBLIC KEY") => {
                return Err(CryptoError::KeyType(
                    "public key supplied where a private key is required".to_string(),
                ));
            }
            Some(label) => {
                return Err(CryptoError::KeyFormat(format!("unsupported PEM label `{label}`")));
            }
            None => return Err(CryptoError::KeyFormat("no PEM boundary found".to_string())),
        };
        Self::validated(inner, None)
    }

    /// Parses an RSA private JSON Web Key. `p` and `q` are required; the CRT
    /// exponents are recomputed rather than trusted.
    pub fn from_jwk(json: &str) -> CryptoResult<Self> {
        let jwk = RsaJwk::parse(json)?;
        let d = jwk.d.as_deref().ok_or_else(|| {
            CryptoError::KeyType("public key supplied where a private key is required".to_string())
        })?;
        let (Some(p), Some(q)) = (jwk.p.as_deref(), jwk.q.as_deref()) else {
            return Err(CryptoError::KeyFormat(
                "private JWK is missing prime factors `p` and `q`".to_string(),
            ));
        };

        let inner = RsaPrivateKey::from_components(
            jwk.modulus()?,
            jwk.exponent()?,
            decode_uint("d", d)?,
            vec![decode_uint("p", p)?, decode_uint("q", q)?],
        )
        .map_err(|e| CryptoError::KeyFormat(format!("invalid RSA private key: {e}")))?;
        Self::validated(inner, jwk.kid.clone())
    }

    fn validated(inner: RsaPrivateKey, kid: Option<String>) -> CryptoResult<Self> {
        inner
            .validate()
            .map_err(|e| CryptoError::KeyFormat(format!("inconsistent RSA private key: {e}")))?;
        Ok(Self { inner, kid })
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.to_public_key(),
            kid: self.kid.clone(),
        }
    }

    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    pub fn modulus_bits(&self) -> usize {
        self.inner.size() * 8
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("modulus_bits", &self.modulus_bits())
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

/// Loads a public key for encryption.
pub fn load_public_key(bytes: &[u8], format: KeyFormat) -> CryptoResult<PublicKey> {
    let text = key_text(bytes)?;
    match format {
        KeyFormat::Pem => PublicKey::from_pem(text),
        KeyFormat::Jwk => PublicKey::from_jwk(text),
    }
}

/// Loads a private key for decryption.
pub fn load_private_key(bytes: &[u8], format: KeyFormat) -> CryptoResult<PrivateKey> {
    let text = key_text(bytes)?;
    match format {
        KeyFormat::Pem => PrivateKey::from_pem(text),
        KeyFormat::Jwk => PrivateKey::from_jwk(text),
    }
}

fn key_text(bytes: &[u8]) -> CryptoResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|_| CryptoError::KeyFormat("key material is not valid UTF-8".to_string()))
}

/// Returns the label of the first PEM pre-encapsulation boundary.
fn pem_label(pem: &str) -> Option<&str> {
    const BEGIN: &str = "-----BEGIN ";
    let rest = &pem[pem.find(BEGIN)? + BEGIN.len()..];
    let end = rest.find("-----")?;
    Some(&rest[..end])
}

fn is_private_label(label: &str) -> bool {
    matches!(label, "PRIVATE KEY" | "RSA PRIVATE KEY" | "ENCRYPTED PRIVATE KEY")
}

fn spki_error(e: spki::Error) -> CryptoError {
    match e {
        spki::Error::OidUnknown { oid } => {
            CryptoError::KeyType(format!("not an RSA public key (algorithm {oid})"))
        }
        other => CryptoError::KeyFormat(format!("invalid SubjectPublicKeyInfo: {other}")),
    }
}

fn pkcs8_error(e: rsa::pkcs8::Error) -> CryptoError {
    match e {
        rsa::pkcs8::Error::PublicKey(spki::Error::OidUnknown { oid }) => {
            CryptoError::KeyType(format!("not an RSA private key (algorithm {oid})"))
        }
        other => CryptoError::KeyFormat(format!("invalid PKCS#8 private key: {other}")),
    }
}

/// RSA members of a JSON Web Key (RFC 7517 / RFC 7518 §6.3).
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct RsaJwk {
    kty: String,
    kid: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
    d: Option<String>,
    p: Option<String>,
    q: Option<String>,
}

impl RsaJwk {
    fn parse(json: &str) -> CryptoResult<Self> {
        let jwk: Self = serde_json::from_str(json)
            .map_err(|e| CryptoError::KeyFormat(format!("invalid JWK: {e}")))?;

        if jwk.kty != "RSA" {
            return Err(CryptoError::KeyType(format!("JWK key type `{}` is not RSA", jwk.kty)));
        }
        if let Some(key_use) = jwk.key_use.as_deref().filter(|u| *u != "enc") {
            return Err(CryptoError::KeyType(format!(
                "JWK is restricted to use `{key_use}`, not encryption"
            )));
        }
        if let Some(alg) = jwk.alg.as_deref().filter(|a| *a != KEY_WRAP_ALG) {
            return Err(CryptoError::KeyType(format!(
                "JWK is bound to algorithm `{alg}`, not {KEY_WRAP_ALG}"
            )));
        }
        Ok(jwk)
    }

    fn modulus(&self) -> CryptoResult<BigUint> {
        let n = self
            .n
            .as_deref()
            .ok_or_else(|| CryptoError::KeyFormat("JWK is missing modulus `n`".to_string()))?;
        decode_uint("n", n)
    }

    fn exponent(&self) -> CryptoResult<BigUint> {
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| CryptoError::KeyFormat("JWK is missing exponent `e`".to_string()))?;
        decode_uint("e", e)
    }
}

/// Decodes a base64url big-endian unsigned integer member.
fn decode_uint(member: &str, value: &str) -> CryptoResult<BigUint> {
    let bytes = Zeroizing::new(URL_SAFE_NO_PAD.decode(value).map_err(|e| {
        CryptoError::KeyFormat(format!("JWK member `{member}` is not base64url: {e}"))
    })?);
    if bytes.is_empty() {
        return Err(CryptoError::KeyFormat(format!("JWK member `{member}` is empty")));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}
