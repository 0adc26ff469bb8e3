//! Common error types for PageLock.
//!
//! The first four variants are the failure classes a viewer can run into
//! while unlocking a page. The rest are infrastructure failures.

use thiserror::Error;

/// Top-level error type for PageLock operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Payload metadata is malformed (bad hex, wrong salt or signature length).
    ///
    /// Never caused by the viewer's password.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cipher failure or sentinel mismatch.
    ///
    /// Bad padding, bad key and a missing sentinel all collapse into this
    /// variant so they cannot be told apart from outside.
    #[error("Wrong password")]
    WrongPassword,

    /// The sentinel matched but the keyed hash over the content did not.
    #[error("Integrity check failed")]
    IntegrityMismatch,

    /// A cached key bundle could not be imported or no longer unlocks the page.
    #[error("Cached key import failed: {0}")]
    CacheImport(String),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_password_message_is_generic() {
        assert_eq!(Error::WrongPassword.to_string(), "Wrong password");
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
