//! Error types for `falkon-core`.
//!
//! Store errors never include message bodies or email addresses, only
//! storage keys and record ids.

use falkon_storage::StorageError;

use crate::submission::FormField;

/// Errors from the message store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage backend returned an error.
    #[error("message storage error: {0}")]
    Storage(#[from] StorageError),

    /// A record could not be serialized.
    #[error("failed to encode message: {reason}")]
    Encode { reason: String },

    /// A stored record could not be read back.
    #[error("failed to decode message at '{key}': {reason}")]
    Decode { key: String, reason: String },
}

/// Errors surfaced through the [`MessageService`](crate::service::MessageService)
/// seam, whichever implementation sits behind it.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The local message store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The remote message service could not be reached.
    #[error("message service unavailable: {reason}")]
    Unavailable { reason: String },

    /// The remote message service answered with an error.
    #[error("message service returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Errors from the contact form submission shim.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// A required field is empty. Nothing was sent.
    #[error("{0} is required")]
    MissingField(FormField),

    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    InFlight,

    /// The message service failed to accept the message.
    #[error("failed to send message: {0}")]
    Send(#[from] ServiceError),
}
