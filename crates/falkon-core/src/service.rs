//! The message service seam.
//!
//! [`MessageService`] is the single interface for the two message
//! operations. Which implementation sits behind it is decided once, at
//! composition time:
//!
//! - [`MessageStore`] when a data service is configured (server side);
//! - the HTTP client in `falkon-client` when an API URL is configured
//!   (client side);
//! - [`DetachedMessages`] otherwise, which accepts and discards submissions.

use tracing::warn;

use crate::error::ServiceError;
use crate::message::{Message, MessageId, NewMessage};
use crate::store::MessageStore;

/// Ingestion and listing of contact messages.
#[async_trait::async_trait]
pub trait MessageService: Send + Sync + 'static {
    /// Append a message and return its new id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the backing service fails. No retry is
    /// attempted.
    async fn send_message(&self, new: NewMessage) -> Result<MessageId, ServiceError>;

    /// Return every message, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the backing service fails.
    async fn get_all_messages(&self) -> Result<Vec<Message>, ServiceError>;

    /// Whether submissions are actually persisted somewhere.
    fn is_attached(&self) -> bool {
        true
    }
}

#[async_trait::async_trait]
impl MessageService for MessageStore {
    async fn send_message(&self, new: NewMessage) -> Result<MessageId, ServiceError> {
        Ok(self.insert(new).await?.id)
    }

    async fn get_all_messages(&self) -> Result<Vec<Message>, ServiceError> {
        Ok(self.list().await?)
    }
}

/// Stand-in used when no data service is configured.
///
/// Submissions succeed with a fresh id but are not stored; listings are
/// always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedMessages;

#[async_trait::async_trait]
impl MessageService for DetachedMessages {
    async fn send_message(&self, _new: NewMessage) -> Result<MessageId, ServiceError> {
        let id = MessageId::generate();
        warn!(id = %id, "no data service configured, message discarded");
        Ok(id)
    }

    async fn get_all_messages(&self) -> Result<Vec<Message>, ServiceError> {
        Ok(Vec::new())
    }

    fn is_attached(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use falkon_storage::MemoryBackend;

    use super::*;

    #[tokio::test]
    async fn store_behind_the_seam_round_trips() {
        let service: Arc<dyn MessageService> =
            Arc::new(MessageStore::new(Arc::new(MemoryBackend::new())));
        let new = NewMessage::new("Jane Doe", "jane@example.com", "Hello");

        let id = service.send_message(new.clone()).await.unwrap();
        let all = service.get_all_messages().await.unwrap();

        assert!(service.is_attached());
        assert_eq!(all[0].id, id);
        assert!(all[0].matches(&new));
    }

    #[tokio::test]
    async fn detached_accepts_and_lists_nothing() {
        let service = DetachedMessages;
        let a = service
            .send_message(NewMessage::new("a", "b", "c"))
            .await
            .unwrap();
        let b = service
            .send_message(NewMessage::new("a", "b", "c"))
            .await
            .unwrap();

        assert_ne!(a, b);
        assert!(!service.is_attached());
        assert!(service.get_all_messages().await.unwrap().is_empty());
    }
}
