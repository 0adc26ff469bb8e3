//! Page configuration and session context.

use serde::{Deserialize, Serialize};

use pagelock_common::{Error, PageId, Result};
use pagelock_crypto::{EncryptedPayload, PagePayload};

/// Alert shown when the password is wrong.
pub const DEFAULT_WRONG_PASSWORD_MESSAGE: &str =
    "Oh, this is an invalid password. Check and try again, please.";

/// Alert shown when the content fails authentication.
pub const DEFAULT_WRONG_HASH_MESSAGE: &str =
    "OOPS, these decrypted content may changed, but you can still have a look.";

/// Localized alert strings supplied by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub wrong_password: String,
    pub wrong_hash: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            wrong_password: DEFAULT_WRONG_PASSWORD_MESSAGE.to_string(),
            wrong_hash: DEFAULT_WRONG_HASH_MESSAGE.to_string(),
        }
    }
}

/// When decrypted content is handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderPolicy {
    /// Render only after the keyed hash matched.
    #[default]
    VerifyFirst,
    /// Render as soon as the sentinel matched, then verify.
    ///
    /// Matches pages produced for hosts that expect the content even when
    /// the hash does not match. A failed check alerts but never retracts.
    Optimistic,
}

/// Session behavior switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(default)]
    pub render_policy: RenderPolicy,
}

/// Everything a page provides at load time, in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Path of the page; selects the cache slot.
    pub page: PageId,
    /// Encrypted content and its metadata.
    pub payload: PagePayload,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub options: SessionOptions,
}

impl PageConfig {
    /// Validate and decode into a session context.
    ///
    /// # Errors
    /// - `Configuration` if the payload is malformed
    pub fn into_context(self) -> Result<PageContext> {
        PageContext::new(self.page, &self.payload, self.messages, self.options)
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Validated, read-only inputs of one page session.
#[derive(Debug, Clone)]
pub struct PageContext {
    page: PageId,
    payload: EncryptedPayload,
    messages: Messages,
    options: SessionOptions,
}

impl PageContext {
    /// Create a context, decoding the payload.
    ///
    /// # Errors
    /// - `Configuration` if the payload is malformed
    pub fn new(
        page: PageId,
        payload: &PagePayload,
        messages: Messages,
        options: SessionOptions,
    ) -> Result<Self> {
        Ok(Self {
            page,
            payload: payload.decode()?,
            messages,
            options,
        })
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    pub fn payload(&self) -> &EncryptedPayload {
        &self.payload
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn render_policy(&self) -> RenderPolicy {
        self.options.render_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> PageConfig {
        PageConfig {
            page: PageId::new("/posts/secret/").unwrap(),
            payload: PagePayload {
                ciphertext: "ac3228b6b3b0f140c60be464290cd1d28fdea1074d9209530d496e60a18e7b098c8da446ca64aec2a80e7cd48b52eca8".to_string(),
                hmac_digest: "630affdf2964710fab3053fe56b8bb35254afff7f4ba92f370212d9b27c0e74d".to_string(),
                key_salt: None,
                iv_salt: None,
            },
            messages: Messages::default(),
            options: SessionOptions::default(),
        }
    }

    #[test]
    fn test_config_serialization() {
        let config = sample_config();
        let json = config.to_json().unwrap();
        let restored = PageConfig::from_json(&json).unwrap();

        assert_eq!(restored, config);
        assert!(json.contains("verify-first"));
    }

    #[test]
    fn test_messages_and_options_default_when_absent() {
        let json = r#"{
            "page": "/posts/secret/",
            "payload": {
                "ciphertext": "00112233445566778899aabbccddeeff",
                "hmacDigest": "630affdf2964710fab3053fe56b8bb35254afff7f4ba92f370212d9b27c0e74d"
            }
        }"#;
        let config = PageConfig::from_json(json).unwrap();

        assert_eq!(config.messages, Messages::default());
        assert_eq!(config.options.render_policy, RenderPolicy::VerifyFirst);
    }

    #[test]
    fn test_optimistic_policy_parses() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"render_policy":"optimistic"}"#).unwrap();
        assert_eq!(options.render_policy, RenderPolicy::Optimistic);
    }

    #[test]
    fn test_malformed_payload_is_configuration_error() {
        let mut config = sample_config();
        config.payload.hmac_digest = "not hex".to_string();

        assert!(matches!(
            config.into_context(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_context_exposes_page() {
        let context = sample_config().into_context().unwrap();
        assert_eq!(context.page().as_str(), "/posts/secret/");
        assert!(context.payload().salts().is_legacy());
    }
}
