//! JWE protected header.

use crate::content::ContentEncryption;
use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The only key management algorithm this crate produces or accepts.
pub const KEY_WRAP_ALG: &str = "RSA-OAEP-256";

/// Protected header of a compact envelope.
///
/// Unknown members are ignored. A repeated member, known or not, makes the
/// header malformed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    pub alg: String,
    pub enc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit: Option<Vec<String>>,
}

impl ProtectedHeader {
    pub fn new(enc: ContentEncryption, kid: Option<&str>) -> Self {
        Self {
            alg: KEY_WRAP_ALG.to_string(),
            enc: enc.name().to_string(),
            kid: kid.map(str::to_string),
            zip: None,
            crit: None,
        }
    }

    /// Serializes to compact JSON and base64url-encodes it.
    pub fn encode(&self) -> CryptoResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| CryptoError::Encryption(format!("header serialization failed: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parses the base64url header segment of a token.
    pub fn decode(segment: &str) -> CryptoResult<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| CryptoError::malformed(format!("header is not base64url: {e}")))?;
        serde_json::from_slice::<UniqueMembers>(&json)
            .map_err(|e| CryptoError::malformed(format!("header is not a JSON object: {e}")))?;
        serde_json::from_slice(&json)
            .map_err(|e| CryptoError::malformed(format!("header is not valid JSON: {e}")))
    }

    /// Checks the header against the pinned algorithm set and returns the
    /// content encryption it declares.
    pub fn validate(&self) -> CryptoResult<ContentEncryption> {
        if self.alg != KEY_WRAP_ALG {
            return Err(CryptoError::UnsupportedAlgorithm(format!(
                "key management algorithm `{}`",
                self.alg
            )));
        }
        if let Some(zip) = &self.zip {
            return Err(CryptoError::UnsupportedAlgorithm(format!("compression `{zip}`")));
        }
        if let Some(crit) = &self.crit {
            return Err(CryptoError::UnsupportedAlgorithm(format!(
                "critical header extensions {crit:?}"
            )));
        }
        self.enc.parse()
    }
}

/// Top-level object whose member names are all distinct.
struct UniqueMembers;

impl<'de> Deserialize<'de> for UniqueMembers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UniqueMembersVisitor)
    }
}

struct UniqueMembersVisitor;

impl<'de> Visitor<'de> for UniqueMembersVisitor {
    type Value = UniqueMembers;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut seen = HashSet::new();
        while let Some(name) = map.next_key::<String>()? {
            map.next_value::<IgnoredAny>()?;
            if seen.contains(&name) {
                return Err(de::Error::custom(format!("duplicate member `{name}`")));
            }
            seen.insert(name);
        }
        Ok(UniqueMembers)
    }
}
