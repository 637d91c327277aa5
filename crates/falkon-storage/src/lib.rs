//! Storage backend abstraction for Falkon.
//!
//! This crate defines the [`StorageBackend`] trait, an append-only key-value
//! interface that knows nothing about messages or HTTP. The message store in
//! `falkon-core` serializes records and hands them to a backend as opaque
//! bytes.
//!
//! Records are write-once: there is no overwrite and no delete. A key can be
//! inserted exactly once and read any number of times afterwards.
//!
//! Three implementations are provided:
//!
//! - [`RedbBackend`]: pure-Rust on-disk backend (feature `redb-backend`, default)
//! - [`RocksDbBackend`]: `RocksDB` on-disk backend (feature `rocksdb-backend`)
//! - [`MemoryBackend`]: in-memory, for development and tests

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

/// A pluggable, append-only key-value storage backend.
///
/// Keys are UTF-8 strings using `/` as a separator (e.g. `messages/<id>`).
/// Values are opaque byte arrays.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Insert a new key-value pair.
    ///
    /// Fails with [`StorageError::KeyExists`] if the key is already present;
    /// stored values are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyExists`] for a duplicate key and
    /// [`StorageError::Write`] if the underlying backend fails.
    async fn insert(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Return every key-value pair whose key starts with `prefix`, in
    /// ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Scan`] if the underlying backend fails.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError>;

    /// List all keys that start with the given prefix.
    ///
    /// The default implementation calls [`scan`](StorageBackend::scan) and
    /// drops the values.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Scan`] if the underlying backend fails.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .scan(prefix)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Check whether a key exists in storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}
