//! Page payload: the encrypted content and its metadata as shipped in a page.

use serde::{Deserialize, Serialize};

use crate::keys::{Salt, SaltPair};
use pagelock_common::{Error, Result};

/// Length of an HMAC-SHA-256 tag in bytes.
pub const SIGNATURE_LENGTH: usize = 32;

/// Expected keyed hash of the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded signature.
    ///
    /// # Errors
    /// - `Configuration` on bad hex or a length other than 32 bytes
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex("hmacDigest", s)?;
        let sig: [u8; SIGNATURE_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            Error::Configuration(format!(
                "Invalid signature length: expected {}, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(sig))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Payload metadata in its on-page, hex-encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    /// AES-256-CBC ciphertext.
    pub ciphertext: String,
    /// HMAC-SHA-256 of the plaintext.
    pub hmac_digest: String,
    /// Absent on pages sealed with the legacy salts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv_salt: Option<String>,
}

impl PagePayload {
    /// Decode and validate every field.
    ///
    /// # Errors
    /// - `Configuration` if any field is malformed
    pub fn decode(&self) -> Result<EncryptedPayload> {
        let ciphertext = decode_hex("ciphertext", &self.ciphertext)?;
        if ciphertext.is_empty() {
            return Err(Error::Configuration("Ciphertext is empty".to_string()));
        }

        let signature = Signature::from_hex(&self.hmac_digest)?;

        let legacy = SaltPair::legacy();
        let key_salt = match &self.key_salt {
            Some(s) => Salt::from_hex(s)?,
            None => legacy.key_salt,
        };
        let iv_salt = match &self.iv_salt {
            Some(s) => Salt::from_hex(s)?,
            None => legacy.iv_salt,
        };

        Ok(EncryptedPayload {
            ciphertext,
            signature,
            salts: SaltPair { key_salt, iv_salt },
        })
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Decoded payload, ready for decryption.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    ciphertext: Vec<u8>,
    signature: Signature,
    salts: SaltPair,
}

impl EncryptedPayload {
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn salts(&self) -> &SaltPair {
        &self.salts
    }
}

fn decode_hex(field: &str, s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim())
        .map_err(|e| Error::Configuration(format!("Invalid hex in {}: {}", field, e)))
}
