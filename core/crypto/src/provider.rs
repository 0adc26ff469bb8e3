//! Capability traits for the cryptographic primitives.
//!
//! Each primitive sits behind its own trait so it can be swapped
//! independently, e.g. for a hardware-backed implementation or a
//! deterministic stub in tests. Every call is a suspension point.

use async_trait::async_trait;
use std::sync::Arc;

use crate::decryption::AesCbc256;
use crate::integrity::HmacSha256;
use crate::kdf::Pbkdf2Sha256;
use crate::keys::{DecryptKey, HmacKey, Iv, KeyMaterial, Salt};
use pagelock_common::{Password, Result};

/// Password-based key derivation.
#[async_trait]
pub trait KeyDerivationProvider: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Import a password as opaque key material.
    async fn import_password(&self, password: &Password) -> Result<KeyMaterial>;

    /// Derive the cipher key from the key salt.
    async fn derive_decrypt_key(&self, material: &KeyMaterial, salt: &Salt) -> Result<DecryptKey>;

    /// Derive the keyed-hash key from the key salt.
    async fn derive_hmac_key(&self, material: &KeyMaterial, salt: &Salt) -> Result<HmacKey>;

    /// Derive the initialization vector from the IV salt.
    async fn derive_iv(&self, material: &KeyMaterial, salt: &Salt) -> Result<Iv>;
}

/// Block cipher in CBC mode with PKCS#7 padding.
#[async_trait]
pub trait CipherProvider: Send + Sync {
    /// Encrypt `plaintext`.
    async fn encrypt(&self, key: &DecryptKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext`.
    ///
    /// # Errors
    /// - Bad padding or a ciphertext that is not block aligned
    async fn decrypt(&self, key: &DecryptKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Keyed hash.
#[async_trait]
pub trait MacProvider: Send + Sync {
    /// Compute the tag of `data`.
    async fn sign(&self, key: &HmacKey, data: &[u8]) -> Result<Vec<u8>>;

    /// Check `signature` against `data`.
    ///
    /// Implementations must compare in constant time.
    async fn verify(&self, key: &HmacKey, data: &[u8], signature: &[u8]) -> Result<bool>;
}

/// The three providers a session needs.
#[derive(Clone)]
pub struct CryptoSuite {
    pub kdf: Arc<dyn KeyDerivationProvider>,
    pub cipher: Arc<dyn CipherProvider>,
    pub mac: Arc<dyn MacProvider>,
}

impl CryptoSuite {
    /// Assemble a suite from individual providers.
    pub fn new(
        kdf: Arc<dyn KeyDerivationProvider>,
        cipher: Arc<dyn CipherProvider>,
        mac: Arc<dyn MacProvider>,
    ) -> Self {
        Self { kdf, cipher, mac }
    }

    /// Pure-Rust implementations of PBKDF2-SHA-256, AES-256-CBC and HMAC-SHA-256.
    pub fn software() -> Self {
        Self::new(
            Arc::new(Pbkdf2Sha256),
            Arc::new(AesCbc256),
            Arc::new(HmacSha256),
        )
    }
}

impl Default for CryptoSuite {
    fn default() -> Self {
        Self::software()
    }
}
