//! Content authentication using HMAC-SHA-256.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::decryption::DecryptedContent;
use crate::keys::HmacKey;
use crate::payload::Signature;
use crate::provider::MacProvider;
use pagelock_common::{Error, Result};

/// Software HMAC-SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

#[async_trait]
impl MacProvider for HmacSha256 {
    async fn sign(&self, key: &HmacKey, data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key.as_bytes())
            .map_err(|e| Error::Crypto(format!("Invalid HMAC key: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    async fn verify(&self, key: &HmacKey, data: &[u8], signature: &[u8]) -> Result<bool> {
        let computed = self.sign(key, data).await?;
        Ok(computed.ct_eq(signature).into())
    }
}

/// Check the decrypted page against the signature shipped with it.
///
/// Returns `Ok(false)` on mismatch; provider failures are errors.
pub async fn verify_content(
    mac: &dyn MacProvider,
    key: &HmacKey,
    content: &DecryptedContent,
    expected: &Signature,
) -> Result<bool> {
    mac.verify(key, content.as_bytes(), expected.as_bytes()).await
}

/// Like [`verify_content`], with a mismatch turned into [`Error::IntegrityMismatch`].
pub async fn ensure_authentic(
    mac: &dyn MacProvider,
    key: &HmacKey,
    content: &DecryptedContent,
    expected: &Signature,
) -> Result<()> {
    if verify_content(mac, key, content, expected).await? {
        Ok(())
    } else {
        Err(Error::IntegrityMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_KEY: [u8; 32] = [
        0xc4, 0x44, 0x4d, 0x86, 0x42, 0x49, 0xf4, 0x97, 0xa0, 0xe3, 0x9c, 0x8a, 0x4c, 0x8a, 0x21,
        0xa3, 0x67, 0x2f, 0x23, 0xab, 0x28, 0xa2, 0x81, 0xa1, 0x5f, 0x41, 0xb5, 0xf8, 0xb3, 0xc0,
        0x80, 0x2b,
    ];
    const LEGACY_SIGNATURE: &str =
        "630affdf2964710fab3053fe56b8bb35254afff7f4ba92f370212d9b27c0e74d";
    const LEGACY_PLAINTEXT: &[u8] = b"<hbe-prefix></hbe-prefix><p>secret</p>";

    #[tokio::test]
    async fn test_sign_known_vector() {
        let tag = HmacSha256
            .sign(&HmacKey::from_bytes(LEGACY_KEY), LEGACY_PLAINTEXT)
            .await
            .unwrap();
        assert_eq!(hex::encode(tag), LEGACY_SIGNATURE);
    }

    #[tokio::test]
    async fn test_verify_accepts_valid_signature() {
        let signature = hex::decode(LEGACY_SIGNATURE).unwrap();
        let ok = HmacSha256
            .verify(&HmacKey::from_bytes(LEGACY_KEY), LEGACY_PLAINTEXT, &signature)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_verify_rejects_flipped_bit() {
        let mut signature = hex::decode(LEGACY_SIGNATURE).unwrap();
        signature[0] ^= 0x01;
        let ok = HmacSha256
            .verify(&HmacKey::from_bytes(LEGACY_KEY), LEGACY_PLAINTEXT, &signature)
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_verify_rejects_truncated_signature() {
        let signature = hex::decode(LEGACY_SIGNATURE).unwrap();
        let ok = HmacSha256
            .verify(&HmacKey::from_bytes(LEGACY_KEY), LEGACY_PLAINTEXT, &signature[..16])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_verify_rejects_other_key() {
        let signature = hex::decode(LEGACY_SIGNATURE).unwrap();
        let ok = HmacSha256
            .verify(&HmacKey::from_bytes([0u8; 32]), LEGACY_PLAINTEXT, &signature)
            .await
            .unwrap();
        assert!(!ok);
    }
}
