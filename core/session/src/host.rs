//! The page host: whatever displays content and talks to the viewer.

use pagelock_crypto::DecryptedContent;

/// Collaborator that receives the results of an unlock.
///
/// Implementations must not block; each call is a notification.
pub trait PageHost: Send + Sync {
    /// Replace the protected region with the decrypted content.
    fn render(&self, content: &DecryptedContent);

    /// Announce that the page has been unlocked.
    ///
    /// Fired after [`PageHost::render`], so listeners see the new content.
    fn content_unlocked(&self) {}

    /// Show a message to the viewer.
    fn alert(&self, message: &str);

    /// Result of the keyed hash check of the decrypted content.
    fn integrity_result(&self, authentic: bool) {
        let _ = authentic;
    }
}
