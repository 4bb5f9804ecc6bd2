//! Persistent tiers behind the memoisation coordinator.
//!
//! [`MemoStore`] is the local persistence contract (get/put/delete plus key
//! listing for pattern deletes); [`RemoteMemoSource`] is the authoritative
//! network tier consulted when the local store misses or is stale. Two store
//! implementations ship here: a DashMap-backed in-memory store for tests and
//! embedding, and a file-backed store persisting one JSON document per
//! namespace.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::warn;

use super::{CacheEntry, MemoError};

/// Errors from the local persistence tier.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Local persistent tier: plain keyed storage of cache entries.
///
/// Implementations must be safe for concurrent use; the coordinator calls in
/// from many tasks at once.
#[async_trait]
pub trait MemoStore: Send + Sync {
    /// Loads an entry, `None` when the key is absent.
    async fn load_entry(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Stores an entry, overwriting any previous value for its key.
    async fn store_entry(&self, entry: &CacheEntry) -> Result<(), StoreError>;

    /// Deletes a key; absent keys are not an error.
    async fn delete_entry(&self, key: &str) -> Result<(), StoreError>;

    /// All stored keys, for pattern-based deletion.
    async fn list_keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Authoritative remote tier, one network round-trip per call.
#[async_trait]
pub trait RemoteMemoSource: Send + Sync {
    /// Fetches an entry, `Ok(None)` when the remote has never seen the key.
    async fn fetch(&self, key: &str) -> Result<Option<CacheEntry>, MemoError>;

    /// Publishes a freshly memoised entry.
    async fn publish(&self, entry: &CacheEntry) -> Result<(), MemoError>;

    /// Deletes one key remotely.
    async fn delete(&self, key: &str) -> Result<(), MemoError>;

    /// Deletes all remote keys matching a regex pattern.
    async fn delete_matching(&self, pattern: &str) -> Result<(), MemoError>;
}

/// In-memory [`MemoStore`].
#[derive(Default)]
pub struct InMemoryMemoStore {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryMemoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoStore for InMemoryMemoStore {
    async fn load_entry(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.get(key).map(|e| e.clone()))
    }

    async fn store_entry(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        self.entries.insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn delete_entry(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}

/// File-backed [`MemoStore`] persisting one JSON document per namespace.
///
/// The whole namespace is read and rewritten per mutation; entry counts stay
/// small enough (one per memoised expression) that this is not a concern.
pub struct FileMemoStore {
    root: PathBuf,
    namespace: String,
}

impl FileMemoStore {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    fn file_path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.namespace))
    }

    async fn load_all(&self) -> Result<HashMap<String, CacheEntry>, StoreError> {
        let path = self.file_path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Deserialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn save_all(&self, entries: &HashMap<String, CacheEntry>) -> Result<(), StoreError> {
        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            warn!(error = %e, "failed to create memo store directory");
            return Err(StoreError::Io(e.to_string()));
        }
        let bytes = serde_json::to_vec(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(self.file_path(), bytes)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl MemoStore for FileMemoStore {
    async fn load_entry(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.load_all().await?.remove(key))
    }

    async fn store_entry(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let mut entries = self.load_all().await?;
        entries.insert(entry.key.clone(), entry.clone());
        self.save_all(&entries).await
    }

    async fn delete_entry(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load_all().await?;
        if entries.remove(key).is_some() {
            self.save_all(&entries).await?;
        }
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load_all().await?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            payload: key.as_bytes().to_vec(),
            memoised_at_unix_sec: 1700000000.0,
            last_read_at_unix_sec: None,
            scan_id: "scan".to_string(),
            quant_id: "quant".to_string(),
            expr_id: "expr".to_string(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemoryMemoStore::new();
        assert_eq!(store.load_entry("a").await.unwrap(), None);

        store.store_entry(&entry("a")).await.unwrap();
        assert_eq!(store.load_entry("a").await.unwrap(), Some(entry("a")));

        store.delete_entry("a").await.unwrap();
        assert_eq!(store.load_entry("a").await.unwrap(), None);
        // Deleting again is fine
        store.delete_entry("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoStore::new(dir.path(), "test");

        store.store_entry(&entry("a")).await.unwrap();
        store.store_entry(&entry("b")).await.unwrap();

        assert_eq!(store.load_entry("a").await.unwrap(), Some(entry("a")));
        let mut keys = store.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        // Survives a fresh handle over the same directory
        let reopened = FileMemoStore::new(dir.path(), "test");
        assert_eq!(reopened.load_entry("b").await.unwrap(), Some(entry("b")));

        store.delete_entry("a").await.unwrap();
        assert_eq!(store.load_entry("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_missing_namespace_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMemoStore::new(dir.path(), "never-written");
        assert_eq!(store.load_entry("a").await.unwrap(), None);
        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
