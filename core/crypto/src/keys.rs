//! Key types with secure memory handling.
//!
//! All key types automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use pagelock_common::{Error, Result, SensitiveBytes};

/// Length of the cipher and keyed-hash keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the CBC initialization vector in bytes (128-bit).
pub const IV_LENGTH: usize = 16;

/// Length of freshly generated salts in bytes.
pub const SALT_LENGTH: usize = 32;

/// Key salt used by pages generated before per-page salts existed.
pub const LEGACY_KEY_SALT: &str = "hexo-blog-encrypt的作者们都是大帅比!";

/// IV salt used by pages generated before per-page salts existed.
pub const LEGACY_IV_SALT: &str = "hexo-blog-encrypt是地表最强Hexo加密插件!";

/// Password imported for stretching.
///
/// This is the only input to the three derivations. It never leaves a
/// key-derivation provider as raw bytes in normal operation.
pub struct KeyMaterial(SensitiveBytes);

impl KeyMaterial {
    /// Wrap imported password bytes.
    pub fn new(material: Vec<u8>) -> Self {
        Self(SensitiveBytes::new(material))
    }

    /// Raw material, for `KeyDerivationProvider` implementations only.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED])")
    }
}

/// AES-256-CBC decryption key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DecryptKey {
    key: [u8; KEY_LENGTH],
}

impl DecryptKey {
    /// Create a decryption key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for DecryptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecryptKey([REDACTED])")
    }
}

/// HMAC-SHA-256 key used to authenticate decrypted content.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacKey {
    key: [u8; KEY_LENGTH],
}

impl HmacKey {
    /// Create an HMAC key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HmacKey([REDACTED])")
    }
}

/// CBC initialization vector.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Iv([u8; IV_LENGTH]);

impl Iv {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; IV_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a lowercase or uppercase hex string of exactly 16 bytes.
    ///
    /// # Errors
    /// - Returns `InvalidInput` on bad hex or wrong length
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| Error::InvalidInput(format!("Invalid IV hex: {}", e)))?;
        let iv: [u8; IV_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "Invalid IV length: expected {}, got {}",
                IV_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(iv))
    }

    /// Get the IV bytes.
    pub fn as_bytes(&self) -> &[u8; IV_LENGTH] {
        &self.0
    }

    /// Lowercase hex, the form kept in the cache record.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iv([REDACTED])")
    }
}

/// Salt for one of the derivations.
///
/// Salts are public; they travel with the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Create from bytes.
    ///
    /// # Errors
    /// - Returns `Configuration` if the salt is empty
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::Configuration("Salt cannot be empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded salt.
    ///
    /// # Errors
    /// - Returns `Configuration` on bad hex or an empty salt
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| Error::Configuration(format!("Invalid salt hex: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Generate a random salt.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut salt = vec![0u8; SALT_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// The two salts a payload was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltPair {
    /// Salt for the decryption and HMAC keys.
    pub key_salt: Salt,
    /// Salt for the IV.
    pub iv_salt: Salt,
}

impl SaltPair {
    /// The fixed salts of pages that carry none.
    pub fn legacy() -> Self {
        Self {
            key_salt: Salt(LEGACY_KEY_SALT.as_bytes().to_vec()),
            iv_salt: Salt(LEGACY_IV_SALT.as_bytes().to_vec()),
        }
    }

    /// Fresh random salts for a new payload.
    pub fn generate() -> Self {
        Self {
            key_salt: Salt::generate(),
            iv_salt: Salt::generate(),
        }
    }

    /// Whether these are the legacy defaults.
    pub fn is_legacy(&self) -> bool {
        *self == Self::legacy()
    }
}

/// Everything needed to decrypt and authenticate a page without a password.
#[derive(Clone, Debug)]
pub struct KeyBundle {
    decrypt_key: DecryptKey,
    hmac_key: HmacKey,
    iv: Iv,
}

impl KeyBundle {
    /// Assemble a bundle.
    pub fn new(decrypt_key: DecryptKey, hmac_key: HmacKey, iv: Iv) -> Self {
        Self {
            decrypt_key,
            hmac_key,
            iv,
        }
    }

    pub fn decrypt_key(&self) -> &DecryptKey {
        &self.decrypt_key
    }

    pub fn hmac_key(&self) -> &HmacKey {
        &self.hmac_key
    }

    pub fn iv(&self) -> &Iv {
        &self.iv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_salts_match_generator() {
        let salts = SaltPair::legacy();
        assert_eq!(
            salts.key_salt.to_hex(),
            "6865786f2d626c6f672d656e6372797074e79a84e4bd9ce88085e4bbace983bde698afe5a4a7e5b885e6af9421"
        );
        assert_eq!(
            salts.iv_salt.to_hex(),
            "6865786f2d626c6f672d656e6372797074e698afe59cb0e8a1a8e69c80e5bcba4865786fe58aa0e5af86e68f92e4bbb621"
        );
        assert!(salts.is_legacy());
    }

    #[test]
    fn test_salt_from_hex_rejects_garbage() {
        assert!(matches!(Salt::from_hex("zz"), Err(Error::Configuration(_))));
        assert!(matches!(Salt::from_hex("abc"), Err(Error::Configuration(_))));
        assert!(matches!(Salt::from_hex(""), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        assert_eq!(salt1.as_bytes().len(), SALT_LENGTH);
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_iv_hex_roundtrip() {
        let iv = Iv::from_hex("6a3f5216a6580b7a345c692651bc6fc5").unwrap();
        assert_eq!(iv.to_hex(), "6a3f5216a6580b7a345c692651bc6fc5");
    }

    #[test]
    fn test_iv_wrong_length_fails() {
        assert!(Iv::from_hex("6a3f5216").is_err());
        assert!(Iv::from_hex("6a3f5216a6580b7a345c692651bc6fc5aa").is_err());
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = DecryptKey::from_bytes([7u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "DecryptKey([REDACTED])");
    }
}
