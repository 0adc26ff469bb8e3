//! JSON Web Key export and import for cached keys.
//!
//! Keys are cached in the shape a browser's `exportKey("jwk", ...)` produces
//! for symmetric keys, so records written by either side stay readable.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keys::{DecryptKey, HmacKey, KEY_LENGTH};
use pagelock_common::{Error, Result};

/// Key type of every symmetric JWK.
pub const KTY_OCT: &str = "oct";

/// Algorithm tag of the AES-256-CBC key.
pub const ALG_AES_CBC: &str = "A256CBC";

/// Algorithm tag of the HMAC-SHA-256 key.
pub const ALG_HMAC: &str = "HS256";

/// A symmetric JSON Web Key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct JsonWebKey {
    pub kty: String,
    pub k: String,
    pub alg: String,
    #[serde(default)]
    pub ext: bool,
    #[serde(default)]
    pub key_ops: Vec<String>,
}

impl JsonWebKey {
    fn oct(key: &[u8; KEY_LENGTH], alg: &str, op: &str) -> Self {
        Self {
            kty: KTY_OCT.to_string(),
            k: URL_SAFE_NO_PAD.encode(key),
            alg: alg.to_string(),
            ext: true,
            key_ops: vec![op.to_string()],
        }
    }

    fn oct_bytes(&self, alg: &str) -> Result<[u8; KEY_LENGTH]> {
        if self.kty != KTY_OCT {
            return Err(Error::CacheImport(format!("Unsupported key type: {}", self.kty)));
        }
        if self.alg != alg {
            return Err(Error::CacheImport(format!(
                "Algorithm mismatch: expected {}, got {}",
                alg, self.alg
            )));
        }

        let mut raw = URL_SAFE_NO_PAD
            .decode(self.k.trim_end_matches('='))
            .map_err(|e| Error::CacheImport(format!("Invalid key encoding: {}", e)))?;
        let key: std::result::Result<[u8; KEY_LENGTH], _> = raw.as_slice().try_into();
        let len = raw.len();
        raw.zeroize();

        key.map_err(|_| {
            Error::CacheImport(format!(
                "Invalid key length: expected {}, got {}",
                KEY_LENGTH, len
            ))
        })
    }
}

impl fmt::Debug for JsonWebKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonWebKey")
            .field("kty", &self.kty)
            .field("k", &"[REDACTED]")
            .field("alg", &self.alg)
            .field("key_ops", &self.key_ops)
            .finish()
    }
}

impl DecryptKey {
    /// Export as an `A256CBC` JWK.
    pub fn to_jwk(&self) -> JsonWebKey {
        JsonWebKey::oct(self.as_bytes(), ALG_AES_CBC, "decrypt")
    }

    /// Import an `A256CBC` JWK.
    ///
    /// # Errors
    /// - `CacheImport` on a wrong key type, algorithm, encoding or length
    pub fn from_jwk(jwk: &JsonWebKey) -> Result<Self> {
        Ok(Self::from_bytes(jwk.oct_bytes(ALG_AES_CBC)?))
    }
}

impl HmacKey {
    /// Export as an `HS256` JWK.
    pub fn to_jwk(&self) -> JsonWebKey {
        JsonWebKey::oct(self.as_bytes(), ALG_HMAC, "verify")
    }

    /// Import an `HS256` JWK.
    ///
    /// # Errors
    /// - `CacheImport` on a wrong key type, algorithm, encoding or length
    pub fn from_jwk(jwk: &JsonWebKey) -> Result<Self> {
        Ok(Self::from_bytes(jwk.oct_bytes(ALG_HMAC)?))
    }
}
