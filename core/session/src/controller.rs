//! Unlock session controller.
//!
//! One controller drives one page view:
//!
//! ```text
//!  Locked ── start ──(record)──> AutoAttempting ──(cached keys ok)──> Unlocked
//!    │                                │
//!    │                                └──(any failure)──> WaitingForInput
//!    └── start ──(no record)──> WaitingForInput
//!  WaitingForInput / Locked (after start) ── submit ──(ok)──> Unlocked
//!                                                     └──(fail)──> Locked
//!  any ── relock ──> Locked
//! ```

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pagelock_common::{Error, Password, Result};
use pagelock_crypto::{
    decrypt_content, derive_keys, verify_content, CryptoSuite, DecryptedContent, KeyBundle,
};
use pagelock_storage::KeyValueStore;

use crate::cache::{CachedKeyBundle, KeyCache};
use crate::config::{PageContext, RenderPolicy};
use crate::host::PageHost;

/// Session handle for correlating log lines of one page view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Generate a new unique session handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Content is hidden; nothing is in progress.
    Locked,
    /// Trying the cached key bundle.
    AutoAttempting,
    /// Content is hidden and the viewer may enter a password.
    WaitingForInput,
    /// Content was rendered and authenticated.
    Unlocked,
}

/// Result of a password submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Content rendered, authenticated and its keys cached.
    Unlocked,
    /// Decryption or the sentinel check failed.
    WrongPassword,
    /// Content decrypted but its keyed hash did not match.
    IntegrityMismatch,
    /// Nothing was attempted: not started, empty password, or already unlocked.
    Ignored,
}

/// Drives cache lookup, key derivation, decryption and verification for
/// one protected page.
///
/// No error crosses this type. Failures on the password path surface as
/// host alerts and an [`UnlockOutcome`]; failures on the cached path are
/// silent and only discard the record.
pub struct SessionController {
    /// Unique session identifier.
    handle: SessionHandle,
    context: PageContext,
    crypto: CryptoSuite,
    cache: KeyCache,
    host: Arc<dyn PageHost>,
    state: SessionState,
    /// Set once `start` has consulted the cache; cleared by `relock`.
    started: bool,
}

impl SessionController {
    /// Create a controller for a page.
    ///
    /// # Postconditions
    /// - State is `Locked`; call [`SessionController::start`] on page load
    pub fn new(
        context: PageContext,
        store: Arc<dyn KeyValueStore>,
        crypto: CryptoSuite,
        host: Arc<dyn PageHost>,
    ) -> Self {
        let cache = KeyCache::new(store, context.page().clone());
        Self {
            handle: SessionHandle::new(),
            context,
            crypto,
            cache,
            host,
            state: SessionState::Locked,
            started: false,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == SessionState::Unlocked
    }

    /// Page-load entry point: unlock with cached keys if they still work.
    ///
    /// # Postconditions
    /// - `Unlocked` if the cached bundle decrypted and authenticated the page
    /// - `WaitingForInput` otherwise; a rejected record has been removed
    pub async fn start(&mut self) -> SessionState {
        if self.state == SessionState::Unlocked {
            return self.state;
        }
        self.started = true;

        let next = match self.cache.load().await {
            Ok(None) => {
                debug!(session = self.handle.as_str(), page = %self.context.page(), "No cached keys");
                SessionState::WaitingForInput
            }
            Ok(Some(record)) => {
                self.state = SessionState::AutoAttempting;
                match self.unlock_cached(&record).await {
                    Ok(()) => {
                        info!(session = self.handle.as_str(), page = %self.context.page(), "Unlocked with cached keys");
                        SessionState::Unlocked
                    }
                    Err(e) => {
                        debug!(session = self.handle.as_str(), error = %e, "Cached keys rejected");
                        self.discard_cache().await;
                        SessionState::WaitingForInput
                    }
                }
            }
            Err(e) => {
                debug!(session = self.handle.as_str(), error = %e, "Cached record unreadable");
                self.discard_cache().await;
                SessionState::WaitingForInput
            }
        };

        self.state = next;
        self.state
    }

    /// Try a password entered by the viewer.
    ///
    /// On success the derived keys are cached under the page path, replacing
    /// any earlier record. Ignored until [`SessionController::start`] has
    /// tried the cache.
    pub async fn submit(&mut self, password: Password) -> UnlockOutcome {
        if !self.started {
            debug!(session = self.handle.as_str(), "Not started, submission ignored");
            return UnlockOutcome::Ignored;
        }
        if self.state == SessionState::Unlocked {
            debug!(session = self.handle.as_str(), "Already unlocked, submission ignored");
            return UnlockOutcome::Ignored;
        }
        if password.is_empty() {
            return UnlockOutcome::Ignored;
        }

        match self.unlock_with_password(&password).await {
            Ok(bundle) => {
                if let Err(e) = self.cache.save(&bundle).await {
                    warn!(session = self.handle.as_str(), error = %e, "Failed to cache keys");
                }
                self.state = SessionState::Unlocked;
                info!(session = self.handle.as_str(), page = %self.context.page(), "Unlocked with password");
                UnlockOutcome::Unlocked
            }
            Err(Error::IntegrityMismatch) => {
                warn!(session = self.handle.as_str(), page = %self.context.page(), "Content failed authentication");
                self.host.alert(&self.context.messages().wrong_hash);
                self.state = SessionState::Locked;
                UnlockOutcome::IntegrityMismatch
            }
            Err(e) => {
                match e {
                    Error::WrongPassword => {
                        debug!(session = self.handle.as_str(), "Wrong password")
                    }
                    other => {
                        warn!(session = self.handle.as_str(), error = %other, "Unlock failed")
                    }
                }
                self.host.alert(&self.context.messages().wrong_password);
                self.state = SessionState::Locked;
                UnlockOutcome::WrongPassword
            }
        }
    }

    /// Forget the cached keys of this page and lock it.
    pub async fn relock(&mut self) {
        self.discard_cache().await;
        self.state = SessionState::Locked;
        self.started = false;
        info!(session = self.handle.as_str(), page = %self.context.page(), "Session relocked");
    }

    async fn unlock_cached(&self, record: &CachedKeyBundle) -> Result<()> {
        let bundle = record.import()?;
        self.open(&bundle).await
    }

    async fn unlock_with_password(&self, password: &Password) -> Result<KeyBundle> {
        let salts = self.context.payload().salts();
        let bundle = derive_keys(self.crypto.kdf.as_ref(), password, salts).await?;
        self.open(&bundle).await?;
        Ok(bundle)
    }

    /// Decrypt and authenticate the page, handing the content to the host
    /// at the point the render policy asks for.
    async fn open(&self, bundle: &KeyBundle) -> Result<()> {
        let payload = self.context.payload();
        let policy = self.context.render_policy();

        let content = decrypt_content(
            self.crypto.cipher.as_ref(),
            payload.ciphertext(),
            bundle.decrypt_key(),
            bundle.iv(),
        )
        .await?;

        if policy == RenderPolicy::Optimistic {
            self.reveal(&content);
        }

        let authentic = verify_content(
            self.crypto.mac.as_ref(),
            bundle.hmac_key(),
            &content,
            payload.signature(),
        )
        .await?;
        self.host.integrity_result(authentic);

        if !authentic {
            return Err(Error::IntegrityMismatch);
        }

        if policy == RenderPolicy::VerifyFirst {
            self.reveal(&content);
        }
        Ok(())
    }

    fn reveal(&self, content: &DecryptedContent) {
        self.host.render(content);
        self.host.content_unlocked();
    }

    async fn discard_cache(&self) {
        if let Err(e) = self.cache.clear().await {
            warn!(session = self.handle.as_str(), error = %e, "Failed to remove cached keys");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_handles_unique() {
        let a = SessionHandle::new();
        let b = SessionHandle::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
