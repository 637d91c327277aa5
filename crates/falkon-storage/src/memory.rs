//! In-memory storage backend.
//!
//! Stores all data in a `BTreeMap` behind a `RwLock`. Nothing is persisted;
//! all records are lost when the process exits. Selected with the
//! `memory:` data URL and used as the real backend in tests.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Data is sorted by key, so prefix scans are a `BTreeMap::range` walk.
/// Clones share the same underlying map.
///
/// # Examples
///
/// ```
/// # use falkon_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.insert("messages/1", b"data").await.unwrap();
/// let val = backend.get("messages/1").await.unwrap();
/// assert_eq!(val, Some(b"data".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn insert(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        match data.entry(key.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::KeyExists {
                key: key.to_owned(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
                Ok(())
            }
        }
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let data = self.data.read().await;
        let pairs = data
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(pairs)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let backend = MemoryBackend::new();
        let result = backend.get("messages/missing").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn insert_then_get() {
        let backend = MemoryBackend::new();
        backend.insert("messages/a", b"hello").await.unwrap();
        let val = backend.get("messages/a").await.unwrap();
        assert_eq!(val, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn insert_is_write_once() {
        let backend = MemoryBackend::new();
        backend.insert("messages/a", b"v1").await.unwrap();

        let err = backend.insert("messages/a", b"v2").await.unwrap_err();
        assert!(matches!(err, StorageError::KeyExists { ref key } if key == "messages/a"));

        // The first value survives.
        let val = backend.get("messages/a").await.unwrap();
        assert_eq!(val, Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn scan_with_prefix() {
        let backend = MemoryBackend::new();
        backend.insert("messages/b", b"2").await.unwrap();
        backend.insert("messages/a", b"1").await.unwrap();
        backend.insert("meta/version", b"3").await.unwrap();

        let pairs = backend.scan("messages/").await.unwrap();
        assert_eq!(
            pairs,
            vec![
                ("messages/a".to_owned(), b"1".to_vec()),
                ("messages/b".to_owned(), b"2".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn list_no_matches_returns_empty() {
        let backend = MemoryBackend::new();
        backend.insert("meta/version", b"1").await.unwrap();
        let keys = backend.list("messages/").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn exists_reflects_inserts() {
        let backend = MemoryBackend::new();
        assert!(!backend.exists("messages/a").await.unwrap());
        backend.insert("messages/a", b"val").await.unwrap();
        assert!(backend.exists("messages/a").await.unwrap());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.insert("messages/a", b"val").await.unwrap();
        let val = clone.get("messages/a").await.unwrap();
        assert_eq!(val, Some(b"val".to_vec()));
    }
}
