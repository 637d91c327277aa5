//! Storage error types.
//!
//! Every variant carries the key, prefix, or path involved so a failed
//! request can be diagnosed from the log line alone.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open the storage backend at the given path.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from storage.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a value to storage.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// The key is already present; records are write-once.
    #[error("key '{key}' already exists")]
    KeyExists { key: String },

    /// Failed to scan keys with the given prefix.
    #[error("failed to scan prefix '{prefix}': {reason}")]
    Scan { prefix: String, reason: String },

    /// Failed to begin or commit a transaction.
    #[error("transaction failed: {reason}")]
    Transaction { reason: String },

    /// A storage key contained invalid UTF-8.
    #[error("invalid key encoding: {reason}")]
    InvalidKey { reason: String },

    /// A blocking storage task was cancelled or panicked.
    #[error("storage task failed: {reason}")]
    Task { reason: String },
}
