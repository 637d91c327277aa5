//! Append-only message store.
//!
//! Each message lives at `messages/<id>` as the JSON encoding of its body.
//! The store assigns the id and the `createdAt` timestamp; callers only
//! supply the three submitted fields. There is no update and no delete.
//!
//! Listing reads the whole collection into memory and sorts it newest
//! first. Message volume is assumed to be small.

use std::sync::Arc;

use falkon_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::message::{Message, MessageId, NewMessage};

/// Storage prefix of the message collection.
pub const MESSAGES_PREFIX: &str = "messages/";

/// On-disk body of a message. The id is the key suffix.
#[derive(Serialize, Deserialize)]
struct StoredMessage {
    name: String,
    email: String,
    message: String,
    created_at: i64,
}

/// The message collection over a storage backend.
pub struct MessageStore {
    storage: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore").finish_non_exhaustive()
    }
}

impl MessageStore {
    /// Create a store stamping messages with the system clock.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Create a store with an explicit clock.
    #[must_use]
    pub fn with_clock(storage: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Append a new message and return the stored record.
    ///
    /// Identical submissions are not deduplicated; each call creates a new
    /// record with a new id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Encode`] if the record cannot be serialized.
    /// - [`StoreError::Storage`] if the backend write fails.
    pub async fn insert(&self, new: NewMessage) -> Result<Message, StoreError> {
        let created_at = self.clock.now_millis();
        let id = MessageId::generate();
        let key = message_key(&id);

        let body = StoredMessage {
            name: new.name,
            email: new.email,
            message: new.message,
            created_at,
        };
        let bytes = serde_json::to_vec(&body).map_err(|e| StoreError::Encode {
            reason: e.to_string(),
        })?;

        self.storage.insert(&key, &bytes).await?;
        debug!(id = %id, created_at, "message stored");

        Ok(Message {
            id,
            name: body.name,
            email: body.email,
            message: body.message,
            created_at,
        })
    }

    /// Return every stored message, most recent first.
    ///
    /// Ordered by descending `createdAt`; records with the same timestamp
    /// are ordered by descending id, which is insertion order reversed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Storage`] if the backend scan fails.
    /// - [`StoreError::Decode`] if a stored record is malformed.
    pub async fn list(&self) -> Result<Vec<Message>, StoreError> {
        let pairs = self.storage.scan(MESSAGES_PREFIX).await?;

        let mut messages = pairs
            .into_iter()
            .map(|(key, bytes)| decode(&key, &bytes))
            .collect::<Result<Vec<_>, _>>()?;

        messages.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        debug!(count = messages.len(), "messages listed");
        Ok(messages)
    }
}

fn message_key(id: &MessageId) -> String {
    format!("{MESSAGES_PREFIX}{id}")
}

fn decode(key: &str, bytes: &[u8]) -> Result<Message, StoreError> {
    let decode_err = |reason: String| StoreError::Decode {
        key: key.to_owned(),
        reason,
    };

    let id: MessageId = key
        .strip_prefix(MESSAGES_PREFIX)
        .ok_or_else(|| decode_err("key outside the message collection".to_owned()))?
        .parse()
        .map_err(|e: uuid::Error| decode_err(e.to_string()))?;
    let body: StoredMessage =
        serde_json::from_slice(bytes).map_err(|e| decode_err(e.to_string()))?;

    Ok(Message {
        id,
        name: body.name,
        email: body.email,
        message: body.message,
        created_at: body.created_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use falkon_storage::MemoryBackend;

    use super::*;

    /// Clock that only moves when told to.
    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn at(millis: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(millis)))
        }

        fn set(&self, millis: i64) {
            self.0.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn make_store() -> (MemoryBackend, MessageStore) {
        let backend = MemoryBackend::new();
        let store = MessageStore::new(Arc::new(backend.clone()));
        (backend, store)
    }

    #[tokio::test]
    async fn insert_stamps_server_time_within_call_window() {
        let (_, store) = make_store();
        let new = NewMessage::new("Jane Doe", "jane@example.com", "Hello");

        let start = chrono::Utc::now().timestamp_millis();
        let stored = store.insert(new.clone()).await.unwrap();
        let end = chrono::Utc::now().timestamp_millis();

        assert!(stored.matches(&new));
        assert!(start <= stored.created_at && stored.created_at <= end);

        let all = store.list().await.unwrap();
        let found: Vec<_> = all.iter().filter(|m| m.id == stored.id).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], &stored);
    }

    #[tokio::test]
    async fn identical_submissions_create_distinct_records() {
        let (_, store) = make_store();
        let new = NewMessage::new("Jane Doe", "jane@example.com", "Hello");

        let a = store.insert(new.clone()).await.unwrap();
        let b = store.insert(new).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let clock = ManualClock::at(1_000);
        let store = MessageStore::with_clock(Arc::new(MemoryBackend::new()), clock.clone());

        store.insert(NewMessage::new("a", "a@x", "first")).await.unwrap();
        clock.set(3_000);
        store.insert(NewMessage::new("c", "c@x", "third")).await.unwrap();
        clock.set(2_000);
        store.insert(NewMessage::new("b", "b@x", "second")).await.unwrap();

        let listed = store.list().await.unwrap();
        let stamps: Vec<i64> = listed.iter().map(|m| m.created_at).collect();
        assert_eq!(stamps, vec![3_000, 2_000, 1_000]);
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let clock = ManualClock::at(5_000);
        let store = MessageStore::with_clock(Arc::new(MemoryBackend::new()), clock);

        let first = store.insert(NewMessage::new("a", "a@x", "1")).await.unwrap();
        let second = store.insert(NewMessage::new("b", "b@x", "2")).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn empty_collection_lists_nothing() {
        let (_, store) = make_store();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_fields_are_stored_as_given() {
        let (_, store) = make_store();
        let stored = store.insert(NewMessage::new("", "", "")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn corrupted_record_is_a_decode_error() {
        let (backend, store) = make_store();
        let key = message_key(&MessageId::generate());
        backend.insert(&key, b"not json").await.unwrap();

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { key: ref k, .. } if *k == key));
    }

    #[tokio::test]
    async fn records_are_written_under_the_message_prefix() {
        let (backend, store) = make_store();
        let stored = store.insert(NewMessage::new("a", "b", "c")).await.unwrap();
        let keys = backend.list(MESSAGES_PREFIX).await.unwrap();
        assert_eq!(keys, vec![format!("messages/{}", stored.id)]);
    }
}
