//! Shared application state for the Falkon server.
//!
//! A single [`AppState`] is built at startup from the detected
//! [`Capabilities`] and shared across all Axum handlers via `Arc`.

use std::sync::Arc;

use falkon_core::service::MessageService;

use crate::auth::AuthProvider;
use crate::capability::Capabilities;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Message ingestion and listing (store-backed or detached).
    pub messages: Arc<dyn MessageService>,
    /// Auth provider selected from the publishable key.
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            messages: capabilities.messages,
            auth: capabilities.auth,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
