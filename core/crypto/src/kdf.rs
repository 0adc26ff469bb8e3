//! Key derivation using PBKDF2-HMAC-SHA-256.
//!
//! A password and two salts yield three independent values:
//!
//! ```text
//! decrypt key = PBKDF2(password, key_salt, 1024, 32 bytes)
//! hmac key    = PBKDF2(password, key_salt, 1024, 32 bytes)
//! iv          = PBKDF2(password, iv_salt,   512, 16 bytes)
//! ```
//!
//! Iteration counts are fixed by the page format and are not configurable.

use async_trait::async_trait;
use sha2::Sha256;

use crate::keys::{
    DecryptKey, HmacKey, Iv, KeyBundle, KeyMaterial, Salt, SaltPair, IV_LENGTH, KEY_LENGTH,
};
use crate::provider::KeyDerivationProvider;
use pagelock_common::{Error, Password, Result};

/// Iterations for the decryption and HMAC keys.
pub const KEY_ITERATIONS: u32 = 1024;

/// Iterations for the IV.
pub const IV_ITERATIONS: u32 = 512;

/// Software PBKDF2-HMAC-SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Sha256;

impl Pbkdf2Sha256 {
    fn stretch(material: &KeyMaterial, salt: &Salt, iterations: u32, out: &mut [u8]) {
        pbkdf2::pbkdf2_hmac::<Sha256>(material.as_bytes(), salt.as_bytes(), iterations, out);
    }
}

#[async_trait]
impl KeyDerivationProvider for Pbkdf2Sha256 {
    fn name(&self) -> &str {
        "pbkdf2-sha256"
    }

    async fn import_password(&self, password: &Password) -> Result<KeyMaterial> {
        Ok(KeyMaterial::new(password.as_bytes().to_vec()))
    }

    async fn derive_decrypt_key(&self, material: &KeyMaterial, salt: &Salt) -> Result<DecryptKey> {
        let mut key = [0u8; KEY_LENGTH];
        Self::stretch(material, salt, KEY_ITERATIONS, &mut key);
        Ok(DecryptKey::from_bytes(key))
    }

    async fn derive_hmac_key(&self, material: &KeyMaterial, salt: &Salt) -> Result<HmacKey> {
        let mut key = [0u8; KEY_LENGTH];
        Self::stretch(material, salt, KEY_ITERATIONS, &mut key);
        Ok(HmacKey::from_bytes(key))
    }

    async fn derive_iv(&self, material: &KeyMaterial, salt: &Salt) -> Result<Iv> {
        let mut iv = [0u8; IV_LENGTH];
        Self::stretch(material, salt, IV_ITERATIONS, &mut iv);
        Ok(Iv::from_bytes(iv))
    }
}

/// Derive the full key bundle for a password.
///
/// The three derivations share the imported material and run concurrently.
///
/// # Errors
/// - `InvalidInput` if the password is empty
/// - Whatever the provider reports
pub async fn derive_keys(
    kdf: &dyn KeyDerivationProvider,
    password: &Password,
    salts: &SaltPair,
) -> Result<KeyBundle> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password cannot be empty".to_string()));
    }

    let material = kdf.import_password(password).await?;
    let (decrypt_key, hmac_key, iv) = futures::try_join!(
        kdf.derive_decrypt_key(&material, &salts.key_salt),
        kdf.derive_hmac_key(&material, &salts.key_salt),
        kdf.derive_iv(&material, &salts.iv_salt),
    )?;

    Ok(KeyBundle::new(decrypt_key, hmac_key, iv))
}
