//! Local filesystem store.

use async_trait::async_trait;
use percent_encoding::{percent_encode, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::provider::KeyValueStore;
use pagelock_common::Result;

/// Extension of record files.
const RECORD_EXTENSION: &str = "json";

/// Longest file name common filesystems accept, in bytes.
const MAX_FILE_NAME: usize = 255;

/// Prefix of digest-named records. Percent-encoded names never contain `_`.
const DIGEST_PREFIX: &str = "_sha256-";

/// Local filesystem store.
///
/// Keeps one file per key in a flat directory. File names are the
/// percent-encoded key, so any key maps to a safe, unique name. Keys whose
/// encoded name would not fit the filesystem are stored under the SHA-256
/// of the key instead.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a new local store with the given root directory.
    ///
    /// # Postconditions
    /// - Root directory is created if it doesn't exist
    ///
    /// # Errors
    /// - Permission denied
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        // Create root if it doesn't exist (sync for constructor)
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(record_file_name(key))
    }
}

fn record_file_name(key: &str) -> String {
    let encoded = percent_encode(key.as_bytes(), NON_ALPHANUMERIC).to_string();
    let name = format!("{}.{}", encoded, RECORD_EXTENSION);
    if name.len() <= MAX_FILE_NAME {
        return name;
    }

    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    format!("{}{}.{}", DIGEST_PREFIX, digest, RECORD_EXTENSION)
}

#[async_trait]
impl KeyValueStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.record_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.record_path(key);
        let tmp = path.with_extension("tmp");

        // Write then rename so a reader never sees a half-written record.
        fs::write(&tmp, value.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "Record written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
