//! Common types used throughout PageLock.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prefix of every cache record key. Kept byte-compatible with pages
/// produced by the hexo-blog-encrypt generator.
pub const STORAGE_KEY_PREFIX: &str = "hexo-blog-encrypt:#";

/// Identity of a protected page: its URL path.
///
/// The cached key bundle of a page is stored under a key derived from
/// this path, so two pages never share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(String);

impl PageId {
    /// Create a new PageId from a URL path.
    ///
    /// # Preconditions
    /// - `path` must be non-empty and start with `/`
    ///
    /// # Errors
    /// - Returns error if path is empty or relative
    pub fn new(path: impl Into<String>) -> crate::Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(crate::Error::InvalidInput(
                "PageId cannot be empty".to_string(),
            ));
        }
        if !path.starts_with('/') {
            return Err(crate::Error::InvalidInput(format!(
                "Page path must be absolute: {}",
                path
            )));
        }
        Ok(Self(path))
    }

    /// Get the inner path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which this page's cached bundle lives.
    pub fn storage_key(&self) -> String {
        format!("{}{}", STORAGE_KEY_PREFIX, self.0)
    }
}

impl TryFrom<String> for PageId {
    type Error = crate::Error;

    fn try_from(path: String) -> crate::Result<Self> {
        Self::new(path)
    }
}

impl From<PageId> for String {
    fn from(id: PageId) -> Self {
        id.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A viewer's password.
///
/// Lives only for the duration of one derivation and is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    /// Wrap a password string.
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// UTF-8 bytes fed to the key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}

/// Sensitive data wrapper that zeroizes on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Create new sensitive bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Get a reference to the inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_page_id_creation() {
        let id = PageId::new("/2024/05/notes/").unwrap();
        assert_eq!(id.as_str(), "/2024/05/notes/");
    }

    #[test]
    fn test_page_id_empty_fails() {
        assert!(PageId::new("").is_err());
    }

    #[test]
    fn test_page_id_relative_fails() {
        assert!(PageId::new("posts/hello").is_err());
    }

    #[test]
    fn test_storage_key_format() {
        let id = PageId::new("/posts/hello/").unwrap();
        assert_eq!(id.storage_key(), "hexo-blog-encrypt:#/posts/hello/");
    }

    #[test]
    fn test_page_id_deserialize_validates() {
        let id: PageId = serde_json::from_str(r#""/posts/a/""#).unwrap();
        assert_eq!(id.as_str(), "/posts/a/");
        assert!(serde_json::from_str::<PageId>(r#""posts/a/""#).is_err());
    }

    #[test]
    fn test_password_debug_redacted() {
        let password = Password::new("hunter2");
        let rendered = format!("{:?}", password);
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_sensitive_bytes_debug_redacted() {
        let bytes = SensitiveBytes::new(vec![1, 2, 3]);
        assert_eq!(format!("{:?}", bytes), "SensitiveBytes([REDACTED; 3 bytes])");
    }

    proptest! {
        #[test]
        fn prop_distinct_pages_get_distinct_keys(a in "/[a-z0-9/]{0,20}", b in "/[a-z0-9/]{0,20}") {
            let pa = PageId::new(a.clone()).unwrap();
            let pb = PageId::new(b.clone()).unwrap();
            prop_assert_eq!(pa.storage_key() == pb.storage_key(), a == b);
        }
    }
}
