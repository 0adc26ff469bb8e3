//! Cryptographic protocol for PageLock.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA-256
//! - AES-256-CBC decryption with a sentinel-prefix password check
//! - Content authentication using HMAC-SHA-256
//! - JWK export/import of derived keys for caching
//! - Sealing of page payloads
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Signatures are compared in constant time

pub mod decryption;
pub mod integrity;
pub mod jwk;
pub mod kdf;
pub mod keys;
pub mod payload;
pub mod provider;
pub mod seal;

pub use decryption::{decrypt_content, AesCbc256, DecryptedContent, SENTINEL};
pub use integrity::{ensure_authentic, verify_content, HmacSha256};
pub use jwk::JsonWebKey;
pub use kdf::{derive_keys, Pbkdf2Sha256, IV_ITERATIONS, KEY_ITERATIONS};
pub use keys::{DecryptKey, HmacKey, Iv, KeyBundle, KeyMaterial, Salt, SaltPair};
pub use payload::{EncryptedPayload, PagePayload, Signature};
pub use provider::{CipherProvider, CryptoSuite, KeyDerivationProvider, MacProvider};
pub use seal::{seal, with_sentinel};
