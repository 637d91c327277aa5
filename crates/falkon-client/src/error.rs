//! Error types for the Falkon client.

use falkon_core::error::ServiceError;

/// All errors that can occur when using the Falkon client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or invalid configuration.
    #[error("falkon config error: {0}")]
    Config(String),

    /// The API returned an HTTP error.
    #[error("falkon API error {status_code}: {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network or HTTP client error.
    #[error("falkon network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("falkon json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api {
                status_code,
                message,
            } => Self::Rejected {
                status: status_code,
                message,
            },
            ClientError::Config(_) | ClientError::Network(_) | ClientError::Json(_) => {
                Self::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}
