//! Per-page cache of derived keys.
//!
//! A record holds the decryption key and HMAC key as JWKs and the IV as
//! lowercase hex:
//!
//! ```json
//! {"dk":{"kty":"oct","k":"...","alg":"A256CBC","ext":true,"key_ops":["decrypt"]},
//!  "iv":"6a3f5216a6580b7a345c692651bc6fc5",
//!  "hmk":{"kty":"oct","k":"...","alg":"HS256","ext":true,"key_ops":["verify"]}}
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use pagelock_common::{Error, PageId, Result};
use pagelock_crypto::{DecryptKey, HmacKey, Iv, JsonWebKey, KeyBundle};
use pagelock_storage::KeyValueStore;

/// Serialized form of a [`KeyBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedKeyBundle {
    pub dk: JsonWebKey,
    pub iv: String,
    pub hmk: JsonWebKey,
}

impl CachedKeyBundle {
    /// Export a bundle.
    pub fn export(bundle: &KeyBundle) -> Self {
        Self {
            dk: bundle.decrypt_key().to_jwk(),
            iv: bundle.iv().to_hex(),
            hmk: bundle.hmac_key().to_jwk(),
        }
    }

    /// Rebuild the bundle.
    ///
    /// # Errors
    /// - `CacheImport` if any of the three parts is malformed
    pub fn import(&self) -> Result<KeyBundle> {
        let decrypt_key = DecryptKey::from_jwk(&self.dk)?;
        let hmac_key = HmacKey::from_jwk(&self.hmk)?;
        let iv = Iv::from_hex(&self.iv)
            .map_err(|e| Error::CacheImport(format!("Invalid cached IV: {}", e)))?;

        Ok(KeyBundle::new(decrypt_key, hmac_key, iv))
    }

    /// Serialize to the on-store JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse a stored record.
    ///
    /// # Errors
    /// - `CacheImport` if the text is not a record
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::CacheImport(e.to_string()))
    }
}

/// Cache slot of one page.
///
/// Records are keyed by the page path; a later save overwrites an earlier
/// one.
pub struct KeyCache {
    store: Arc<dyn KeyValueStore>,
    page: PageId,
    key: String,
}

impl KeyCache {
    /// Bind a store to a page.
    pub fn new(store: Arc<dyn KeyValueStore>, page: PageId) -> Self {
        let key = page.storage_key();
        Self { store, page, key }
    }

    /// Key of this page's record in the store.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Load the cached record, if any.
    ///
    /// # Errors
    /// - `CacheImport` if a record exists but cannot be parsed
    /// - Store failures
    pub async fn load(&self) -> Result<Option<CachedKeyBundle>> {
        match self.store.get(&self.key).await? {
            Some(json) => CachedKeyBundle::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    /// Persist a bundle, replacing any previous record.
    pub async fn save(&self, bundle: &KeyBundle) -> Result<()> {
        let json = CachedKeyBundle::export(bundle).to_json()?;
        self.store.set(&self.key, json).await?;

        debug!(page = %self.page, store = self.store.name(), "Key bundle cached");
        Ok(())
    }

    /// Remove the record. Succeeds when there is none.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await?;

        debug!(page = %self.page, store = self.store.name(), "Key bundle removed");
        Ok(())
    }

    /// Check whether a record exists.
    pub async fn exists(&self) -> Result<bool> {
        self.store.contains(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelock_storage::{LocalStore, MemoryStore};

    const LEGACY_KEY: &str = "c4444d864249f497a0e39c8a4c8a21a3672f23ab28a281a15f41b5f8b3c0802b";
    const LEGACY_IV: &str = "6a3f5216a6580b7a345c692651bc6fc5";

    fn legacy_bundle() -> KeyBundle {
        let key: [u8; 32] = hex::decode(LEGACY_KEY).unwrap().try_into().unwrap();
        KeyBundle::new(
            DecryptKey::from_bytes(key),
            HmacKey::from_bytes(key),
            Iv::from_hex(LEGACY_IV).unwrap(),
        )
    }

    fn page() -> PageId {
        PageId::new("/posts/secret/").unwrap()
    }

    #[test]
    fn test_record_shape() {
        let record = CachedKeyBundle::export(&legacy_bundle());
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

        assert_eq!(value["iv"], LEGACY_IV);
        assert_eq!(value["dk"]["kty"], "oct");
        assert_eq!(value["dk"]["alg"], "A256CBC");
        assert_eq!(value["dk"]["key_ops"][0], "decrypt");
        assert_eq!(value["hmk"]["alg"], "HS256");
        assert_eq!(value["hmk"]["key_ops"][0], "verify");
        assert_eq!(value["dk"]["k"], value["hmk"]["k"]);
    }

    #[test]
    fn test_export_import() {
        let bundle = legacy_bundle();
        let restored = CachedKeyBundle::export(&bundle).import().unwrap();

        assert_eq!(restored.decrypt_key().as_bytes(), bundle.decrypt_key().as_bytes());
        assert_eq!(restored.hmac_key().as_bytes(), bundle.hmac_key().as_bytes());
        assert_eq!(restored.iv(), bundle.iv());
    }

    #[test]
    fn test_import_rejects_bad_iv() {
        let mut record = CachedKeyBundle::export(&legacy_bundle());
        record.iv = "6a3f".to_string();
        assert!(matches!(record.import(), Err(Error::CacheImport(_))));
    }

    #[test]
    fn test_import_rejects_swapped_keys() {
        let mut record = CachedKeyBundle::export(&legacy_bundle());
        std::mem::swap(&mut record.dk, &mut record.hmk);
        assert!(matches!(record.import(), Err(Error::CacheImport(_))));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            CachedKeyBundle::from_json("{\"dk\":1}"),
            Err(Error::CacheImport(_))
        ));
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = MemoryStore::new();
        let cache = KeyCache::new(Arc::new(store.clone()), page());

        assert!(cache.load().await.unwrap().is_none());

        cache.save(&legacy_bundle()).await.unwrap();
        assert!(store.contains("hexo-blog-encrypt:#/posts/secret/").await.unwrap());
        assert_eq!(
            cache.load().await.unwrap(),
            Some(CachedKeyBundle::export(&legacy_bundle()))
        );

        cache.clear().await.unwrap();
        assert!(!cache.exists().await.unwrap());
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_pages_do_not_share_slots() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let a = KeyCache::new(store.clone(), page());
        let b = KeyCache::new(store, PageId::new("/posts/other/").unwrap());

        a.save(&legacy_bundle()).await.unwrap();
        assert!(b.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_store_persists_record() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = KeyCache::new(Arc::new(LocalStore::new(temp.path()).unwrap()), page());
        cache.save(&legacy_bundle()).await.unwrap();

        let reopened = KeyCache::new(Arc::new(LocalStore::new(temp.path()).unwrap()), page());
        let bundle = reopened.load().await.unwrap().unwrap().import().unwrap();
        assert_eq!(bundle.iv().to_hex(), LEGACY_IV);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_import_error() {
        let store = MemoryStore::new();
        store
            .set("hexo-blog-encrypt:#/posts/secret/", "not json".to_string())
            .await
            .unwrap();
        let cache = KeyCache::new(Arc::new(store), page());

        assert!(matches!(cache.load().await, Err(Error::CacheImport(_))));
    }
}
