//! `RocksDB` storage backend.
//!
//! Wraps the `rocksdb` crate behind the [`StorageBackend`] trait. All
//! operations are dispatched to a blocking thread via
//! [`tokio::task::spawn_blocking`] since `RocksDB` is a synchronous C++
//! library.
//!
//! `RocksDB` has no compare-and-set outside its transaction API, so inserts
//! are serialized through a process-local mutex to keep the write-once check
//! and the put atomic with respect to each other.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options};

use crate::{StorageBackend, StorageError};

type Db = DBWithThreadMode<MultiThreaded>;

/// A storage backend backed by `RocksDB`.
///
/// # Examples
///
/// ```no_run
/// # use falkon_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("/var/lib/falkon/rocksdb").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    insert_lock: Arc<Mutex<()>>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open a `RocksDB` database at the given path, creating the directory if
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` fails to open or create the
    /// database at the specified path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            db: Arc::new(db),
            insert_lock: Arc::new(Mutex::new(())),
            path: path.to_path_buf(),
        })
    }

    /// Return the filesystem path of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn task_failed(e: &tokio::task::JoinError) -> StorageError {
    StorageError::Task {
        reason: format!("blocking task panicked: {e}"),
    }
}

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || {
            db.get(key.as_bytes()).map_err(|e| StorageError::Read {
                key,
                reason: e.to_string(),
            })
        })
        .await
        .map_err(|e| task_failed(&e))?
    }

    async fn insert(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let db = Arc::clone(&self.db);
        let lock = Arc::clone(&self.insert_lock);
        let key = key.to_owned();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().map_err(|e| StorageError::Write {
                key: key.clone(),
                reason: format!("insert lock poisoned: {e}"),
            })?;
            let existing = db.get(key.as_bytes()).map_err(|e| StorageError::Write {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            if existing.is_some() {
                return Err(StorageError::KeyExists { key });
            }
            db.put(key.as_bytes(), &value)
                .map_err(|e| StorageError::Write {
                    key,
                    reason: e.to_string(),
                })
        })
        .await
        .map_err(|e| task_failed(&e))?
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || {
            let iter = db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));

            let mut pairs = Vec::new();
            for item in iter {
                let (k, v) = item.map_err(|e| StorageError::Scan {
                    prefix: prefix.clone(),
                    reason: e.to_string(),
                })?;
                if !k.starts_with(prefix.as_bytes()) {
                    break;
                }
                let key = String::from_utf8(k.to_vec()).map_err(|e| StorageError::InvalidKey {
                    reason: e.to_string(),
                })?;
                pairs.push((key, v.to_vec()));
            }
            Ok(pairs)
        })
        .await
        .map_err(|e| task_failed(&e))?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_is_write_once_and_scannable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksDbBackend::open(dir.path()).unwrap();

        backend.insert("messages/b", b"2").await.unwrap();
        backend.insert("messages/a", b"1").await.unwrap();
        let err = backend.insert("messages/a", b"x").await.unwrap_err();
        assert!(matches!(err, StorageError::KeyExists { .. }));

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
    async fn scan_stops_before_non_utf8_keys_outside_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksDbBackend::open(dir.path()).unwrap();

        backend.insert("messages/a", b"1").await.unwrap();
        // Sorts right after every `messages/` key.
        backend.db.put(b"messages0\xff\xfe", b"raw").unwrap();

        let pairs = backend.scan("messages/").await.unwrap();
        assert_eq!(pairs, vec![("messages/a".to_owned(), b"1".to_vec())]);
    }
}
