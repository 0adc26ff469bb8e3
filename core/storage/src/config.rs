//! Store selection from configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::local::LocalStore;
use crate::memory::MemoryStore;
use crate::provider::KeyValueStore;
use pagelock_common::{Error, Result};

/// Which store holds cached key bundles.
///
/// Read from JSON tagged by `kind`:
///
/// ```json
/// {"kind": "memory"}
/// {"kind": "local", "root": "/home/me/.cache/pagelock"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Forgotten when the process exits.
    #[default]
    Memory,
    /// One file per key under `root`.
    Local { root: PathBuf },
}

impl StoreConfig {
    /// Parse a store configuration.
    ///
    /// # Errors
    /// - `Configuration` on an unknown kind or a missing field
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("Invalid store configuration: {}", e)))
    }

    /// Name of the store this configuration opens.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Local { .. } => "local",
        }
    }

    /// Open the configured store.
    ///
    /// # Errors
    /// - The local root cannot be created
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
        match self {
            StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreConfig::Local { root } => Ok(Arc::new(LocalStore::new(root)?)),
        }
    }
}
