//! AES-256-CBC decryption and the sentinel check.
//!
//! CBC gives confidentiality only. A page is accepted as a decryption
//! candidate when its plaintext starts with [`SENTINEL`]; the keyed hash in
//! [`crate::integrity`] is the actual authenticity check.

use aes::Aes256;
use async_trait::async_trait;
use cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keys::{DecryptKey, Iv};
use crate::provider::CipherProvider;
use pagelock_common::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Marker every sealed page starts with.
pub const SENTINEL: &str = "<hbe-prefix></hbe-prefix>";

/// Software AES-256-CBC with PKCS#7 padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCbc256;

#[async_trait]
impl CipherProvider for AesCbc256 {
    async fn encrypt(&self, key: &DecryptKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv.as_bytes())
            .map_err(|e| Error::Crypto(format!("Invalid key or IV: {}", e)))?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    async fn decrypt(&self, key: &DecryptKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv.as_bytes())
            .map_err(|e| Error::Crypto(format!("Invalid key or IV: {}", e)))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| Error::Crypto(format!("Decryption failed: {}", e)))
    }
}

/// Plaintext of a page that passed the sentinel check.
///
/// Not yet authenticated; see [`crate::integrity::verify_content`].
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DecryptedContent(String);

impl DecryptedContent {
    /// Full plaintext, sentinel included. This is what the signature covers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Markup after the sentinel.
    pub fn body(&self) -> &str {
        &self.0[SENTINEL.len()..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DecryptedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecryptedContent([REDACTED; {} bytes])", self.0.len())
    }
}

/// Decrypt a page and check the sentinel.
///
/// Every failure, whether cipher-level, UTF-8 or sentinel, is reported as
/// [`Error::WrongPassword`].
pub async fn decrypt_content(
    cipher: &dyn CipherProvider,
    ciphertext: &[u8],
    key: &DecryptKey,
    iv: &Iv,
) -> Result<DecryptedContent> {
    let plaintext = cipher
        .decrypt(key, iv, ciphertext)
        .await
        .map_err(|_| Error::WrongPassword)?;

    let mut decoded = match String::from_utf8(plaintext) {
        Ok(decoded) => decoded,
        Err(e) => {
            e.into_bytes().zeroize();
            return Err(Error::WrongPassword);
        }
    };

    if !decoded.starts_with(SENTINEL) {
        decoded.zeroize();
        return Err(Error::WrongPassword);
    }

    Ok(DecryptedContent(decoded))
}
