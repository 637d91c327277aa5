//! Falkon client SDK.
//!
//! Submits and lists contact messages against a Falkon server. The
//! [`FalkonClient`] implements [`MessageService`], so it plugs straight into
//! the [`ContactForm`] submission shim.
//!
//! Requests are sent once: there is no retry and, unless configured, no
//! timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Instant;
//!
//! use falkon_core::submission::ContactForm;
//!
//! # async fn example() {
//! let service = falkon_client::service_from_env();
//! let mut form = ContactForm::with_fields("Jane Doe", "jane@example.com", "Hello");
//! if form.submit(service.as_ref(), Instant::now).await.is_ok() {
//!     assert!(form.is_cleared());
//! }
//! # }
//! ```
//!
//! [`MessageService`]: falkon_core::service::MessageService
//! [`ContactForm`]: falkon_core::submission::ContactForm

mod client;
mod error;

pub use client::FalkonClient;
pub use error::ClientError;

use std::sync::Arc;
use std::time::Duration;

use falkon_core::service::{DetachedMessages, MessageService};
use tracing::warn;

/// Environment variable naming the server base URL.
pub const API_URL_ENV: &str = "FALKON_API_URL";

/// Configuration for the Falkon client.
#[derive(Debug, Clone, Default)]
pub struct FalkonConfig {
    /// Server base URL, e.g. `https://contact.example.com`.
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Select the message service from `FALKON_API_URL`.
///
/// See [`service_from_url`].
#[must_use]
pub fn service_from_env() -> Arc<dyn MessageService> {
    service_from_url(std::env::var(API_URL_ENV).ok().as_deref())
}

/// Select the message service for a raw base URL.
///
/// Returns a [`FalkonClient`] when the URL is a valid http(s) URL, and
/// [`DetachedMessages`] (submissions accepted and discarded) otherwise.
#[must_use]
pub fn service_from_url(raw: Option<&str>) -> Arc<dyn MessageService> {
    let Some(raw) = raw.map(str::trim).filter(|u| !u.is_empty()) else {
        warn!("{API_URL_ENV} not set, contact messages will not be sent");
        return Arc::new(DetachedMessages);
    };

    match FalkonClient::new(raw) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "failed to initialize Falkon client, contact messages will not be sent");
            Arc::new(DetachedMessages)
        }
    }
}
