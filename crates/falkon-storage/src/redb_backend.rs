//! Pure-Rust redb storage backend, the default on-disk store.
//!
//! redb is a B-tree store with ACID transactions. The write-once check and
//! the insert happen inside the same write transaction, so a duplicate key
//! can never overwrite an existing record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{StorageBackend, StorageError};

/// The single table holding every record.
const DATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("data");

/// A storage backend backed by a redb database file.
///
/// Blocking redb calls are offloaded to the Tokio blocking thread pool.
///
/// # Examples
///
/// ```no_run
/// # use falkon_storage::RedbBackend;
/// let backend = RedbBackend::open("/var/lib/falkon/messages.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if redb fails to open or create the
    /// file, or [`StorageError::Transaction`] if the data table cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Opening the table in a write transaction creates it if missing, so
        // read transactions on a fresh file never see a missing table.
        let txn = db.begin_write().map_err(|e| StorageError::Transaction {
            reason: e.to_string(),
        })?;
        txn.open_table(DATA_TABLE)
            .map_err(|e| StorageError::Transaction {
                reason: format!("open table 'data': {e}"),
            })?;
        txn.commit().map_err(|e| StorageError::Transaction {
            reason: e.to_string(),
        })?;

        Ok(Self {
            db: Arc::new(db),
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
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || {
            let read_err = |reason: String| StorageError::Read {
                key: key.clone(),
                reason,
            };
            let txn = db.begin_read().map_err(|e| read_err(e.to_string()))?;
            let table = txn
                .open_table(DATA_TABLE)
                .map_err(|e| read_err(e.to_string()))?;
            let value = table
                .get(key.as_str())
                .map_err(|e| read_err(e.to_string()))?
                .map(|v| v.value().to_vec());
            Ok(value)
        })
        .await
        .map_err(|e| task_failed(&e))?
    }

    async fn insert(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || {
            let write_err = |reason: String| StorageError::Write {
                key: key.clone(),
                reason,
            };
            let txn = db.begin_write().map_err(|e| StorageError::Transaction {
                reason: e.to_string(),
            })?;
            {
                let mut table = txn
                    .open_table(DATA_TABLE)
                    .map_err(|e| write_err(e.to_string()))?;
                let exists = table
                    .get(key.as_str())
                    .map_err(|e| write_err(e.to_string()))?
                    .is_some();
                if exists {
                    // Dropping the uncommitted transaction aborts it.
                    return Err(StorageError::KeyExists { key: key.clone() });
                }
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| write_err(e.to_string()))?;
            }
            txn.commit().map_err(|e| StorageError::Transaction {
                reason: e.to_string(),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| task_failed(&e))?
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || {
            let scan_err = |reason: String| StorageError::Scan {
                prefix: prefix.clone(),
                reason,
            };
            let txn = db.begin_read().map_err(|e| scan_err(e.to_string()))?;
            let table = txn
                .open_table(DATA_TABLE)
                .map_err(|e| scan_err(e.to_string()))?;

            let mut pairs = Vec::new();
            let range = table
                .range(prefix.as_str()..)
                .map_err(|e| scan_err(e.to_string()))?;
            for item in range {
                let (k, v) = item.map_err(|e| scan_err(e.to_string()))?;
                let key = k.value();
                if !key.starts_with(prefix.as_str()) {
                    break;
                }
                pairs.push((key.to_owned(), v.value().to_vec()));
            }
            Ok(pairs)
        })
        .await
        .map_err(|e| task_failed(&e))?
    }
}
