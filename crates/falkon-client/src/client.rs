//! Falkon client implementation.

use falkon_core::error::ServiceError;
use falkon_core::message::{Message, MessageId, NewMessage};
use falkon_core::service::MessageService;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::FalkonConfig;
use crate::error::ClientError;

/// HTTP client for a Falkon server.
#[derive(Debug, Clone)]
pub struct FalkonClient {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    id: MessageId,
}

#[derive(Deserialize)]
struct MessageListResponse {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl FalkonClient {
    /// Create a client for the given base URL with no request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the URL is not a valid http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_config(FalkonConfig {
            base_url: base_url.to_owned(),
            ..FalkonConfig::default()
        })
    }

    /// Create a client with full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the URL is not a valid http(s) URL,
    /// or [`ClientError::Network`] if the HTTP client cannot be built.
    pub fn with_config(cfg: FalkonConfig) -> Result<Self, ClientError> {
        let trimmed = cfg.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| ClientError::Config(format!("invalid base URL '{trimmed}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base URL must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let mut builder =
            reqwest::Client::builder().user_agent(concat!("falkon-client/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::Network)?;

        Ok(Self { base_url, client })
    }

    /// The server base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit a contact message and return its new id.
    ///
    /// Sent once; a failed call is not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn send_message(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<MessageId, ClientError> {
        let body = NewMessage::new(name, email, message);
        let resp: SendMessageResponse = self
            .request(Method::POST, "/v1/messages", Some(&body))
            .await?;
        Ok(resp.id)
    }

    /// Fetch every message, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn get_all_messages(&self) -> Result<Vec<Message>, ClientError> {
        let resp: MessageListResponse = self
            .request::<MessageListResponse, ()>(Method::GET, "/v1/messages", None)
            .await?;
        Ok(resp.messages)
    }

    // --- Private ---

    /// Append `path` to the base URL, keeping any base path prefix.
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| ClientError::Config(format!("invalid request path '{path}': {e}")))
    }

    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;

        let mut req = self.client.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        Err(ClientError::Api {
            status_code: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl MessageService for FalkonClient {
    async fn send_message(&self, new: NewMessage) -> Result<MessageId, ServiceError> {
        Ok(FalkonClient::send_message(self, &new.name, &new.email, &new.message).await?)
    }

    async fn get_all_messages(&self) -> Result<Vec<Message>, ServiceError> {
        Ok(FalkonClient::get_all_messages(self).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use falkon_core::submission::{ContactForm, SubmissionState};
    use falkon_server::capability::Capabilities;
    use falkon_server::routes::build_router;
    use falkon_server::state::AppState;
    use tokio::net::TcpListener;

    use super::*;
    use crate::service_from_url;

    /// Start a server over an in-memory store and return its base URL.
    async fn spawn_server() -> String {
        let caps = Capabilities::detect(None, Some("memory:"));
        let app = build_router(Arc::new(AppState::new(caps)));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(matches!(
            FalkonClient::new("ftp://example.com"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            FalkonClient::new("not a url"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = FalkonClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.endpoint("/v1/messages").unwrap().as_str(),
            "http://localhost:8080/v1/messages"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        for base in ["https://example.com/api", "https://example.com/api/"] {
            let client = FalkonClient::new(base).unwrap();
            assert_eq!(
                client.endpoint("/v1/messages").unwrap().as_str(),
                "https://example.com/api/v1/messages"
            );
        }
    }

    #[tokio::test]
    async fn send_then_list_against_a_live_server() {
        let client = FalkonClient::new(&spawn_server().await).unwrap();

        let id = client
            .send_message("Jane Doe", "jane@example.com", "Hello")
            .await
            .unwrap();
        let messages = client.get_all_messages().await.unwrap();

        assert_eq!(messages[0].id, id);
        assert_eq!(messages[0].name, "Jane Doe");
        assert_eq!(messages[0].email, "jane@example.com");
        assert_eq!(messages[0].message, "Hello");
    }

    #[tokio::test]
    async fn reaches_a_server_mounted_under_a_path_prefix() {
        let caps = Capabilities::detect(None, Some("memory:"));
        let app = axum::Router::new().nest("/api", build_router(Arc::new(AppState::new(caps))));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = FalkonClient::new(&format!("http://{addr}/api/")).unwrap();
        let id = client
            .send_message("Jane Doe", "jane@example.com", "Hello")
            .await
            .unwrap();
        assert_eq!(client.get_all_messages().await.unwrap()[0].id, id);
    }

    #[tokio::test]
    async fn configured_timeout_bounds_a_silent_server() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = FalkonClient::with_config(FalkonConfig {
            base_url: format!("http://{addr}"),
            timeout: Some(Duration::from_millis(200)),
        })
        .unwrap();

        let err = client
            .send_message("Jane Doe", "jane@example.com", "Hello")
            .await
            .unwrap_err();
        assert!(matches!(&err, ClientError::Network(e) if e.is_timeout()));
        assert!(matches!(
            ServiceError::from(err),
            ServiceError::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn contact_form_submits_through_the_client() {
        let service = service_from_url(Some(&spawn_server().await));
        assert!(service.is_attached());

        let mut form = ContactForm::with_fields("Jane Doe", "jane@example.com", "Hello");
        let id = form.submit(service.as_ref(), Instant::now).await.unwrap();

        assert!(form.is_cleared());
        assert!(matches!(form.state(), SubmissionState::Succeeded { id: got, .. } if *got == id));
        assert_eq!(service.get_all_messages().await.unwrap()[0].id, id);
    }

    #[tokio::test]
    async fn unreachable_server_fails_and_keeps_fields() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = FalkonClient::new(&format!("http://{addr}")).unwrap();

        let mut form = ContactForm::with_fields("Jane Doe", "jane@example.com", "Hello");
        let result = form.submit(&client, Instant::now).await;

        assert!(result.is_err());
        assert!(matches!(form.state(), SubmissionState::Failed { .. }));
        assert_eq!(form.name, "Jane Doe");
        assert_eq!(form.message, "Hello");
    }

    #[tokio::test]
    async fn missing_url_falls_back_to_detached() {
        for raw in [None, Some(""), Some("mailto:team@example.com")] {
            let service = service_from_url(raw);
            assert!(!service.is_attached());
            assert!(service.get_all_messages().await.unwrap().is_empty());
        }
    }
}
