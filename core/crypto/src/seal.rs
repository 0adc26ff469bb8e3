//! Producing page payloads.
//!
//! This is the build-time side of the protocol: it turns a password and
//! page markup into the metadata embedded in the page.

use crate::decryption::SENTINEL;
use crate::kdf::derive_keys;
use crate::keys::SaltPair;
use crate::payload::PagePayload;
use crate::provider::CryptoSuite;
use pagelock_common::{Error, Password, Result};

/// Prepend the sentinel to page markup.
pub fn with_sentinel(body: &str) -> String {
    format!("{}{}", SENTINEL, body)
}

/// Encrypt and sign `plaintext` for embedding in a page.
///
/// Legacy salts are left out of the payload so that older readers still
/// find them by default.
///
/// # Errors
/// - `InvalidInput` if the password is empty or the plaintext lacks the sentinel
pub async fn seal(
    suite: &CryptoSuite,
    password: &Password,
    plaintext: &str,
    salts: &SaltPair,
) -> Result<PagePayload> {
    if !plaintext.starts_with(SENTINEL) {
        return Err(Error::InvalidInput(
            "Plaintext must start with the sentinel".to_string(),
        ));
    }

    let bundle = derive_keys(suite.kdf.as_ref(), password, salts).await?;
    let (ciphertext, signature) = futures::try_join!(
        suite
            .cipher
            .encrypt(bundle.decrypt_key(), bundle.iv(), plaintext.as_bytes()),
        suite.mac.sign(bundle.hmac_key(), plaintext.as_bytes()),
    )?;

    let (key_salt, iv_salt) = if salts.is_legacy() {
        (None, None)
    } else {
        (Some(salts.key_salt.to_hex()), Some(salts.iv_salt.to_hex()))
    };

    Ok(PagePayload {
        ciphertext: hex::encode(ciphertext),
        hmac_digest: hex::encode(signature),
        key_salt,
        iv_salt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decryption::decrypt_content;
    use crate::integrity::verify_content;

    #[tokio::test]
    async fn test_seal_legacy_matches_known_payload() {
        let suite = CryptoSuite::software();
        let payload = seal(
            &suite,
            &Password::new("correct"),
            "<hbe-prefix></hbe-prefix><p>secret</p>",
            &SaltPair::legacy(),
        )
        .await
        .unwrap();

        assert_eq!(
            payload.ciphertext,
            "ac3228b6b3b0f140c60be464290cd1d28fdea1074d9209530d496e60a18e7b098c8da446ca64aec2a80e7cd48b52eca8"
        );
        assert_eq!(
            payload.hmac_digest,
            "630affdf2964710fab3053fe56b8bb35254afff7f4ba92f370212d9b27c0e74d"
        );
        assert!(payload.key_salt.is_none());
        assert!(payload.iv_salt.is_none());
    }

    #[tokio::test]
    async fn test_seal_then_open_with_fresh_salts() {
        let suite = CryptoSuite::software();
        let password = Password::new("open sesame");
        let plaintext = with_sentinel("<h1>Draft</h1>");

        let payload = seal(&suite, &password, &plaintext, &SaltPair::generate())
            .await
            .unwrap();
        assert!(payload.key_salt.is_some());

        let decoded = payload.decode().unwrap();
        let bundle = derive_keys(suite.kdf.as_ref(), &password, decoded.salts())
            .await
            .unwrap();
        let content = decrypt_content(
            suite.cipher.as_ref(),
            decoded.ciphertext(),
            bundle.decrypt_key(),
            bundle.iv(),
        )
        .await
        .unwrap();

        assert_eq!(content.as_str(), plaintext);
        assert!(verify_content(
            suite.mac.as_ref(),
            bundle.hmac_key(),
            &content,
            decoded.signature()
        )
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn test_seal_requires_sentinel() {
        let result = seal(
            &CryptoSuite::software(),
            &Password::new("pw"),
            "<p>bare</p>",
            &SaltPair::legacy(),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
