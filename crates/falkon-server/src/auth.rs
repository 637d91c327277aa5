//! Authentication layer.
//!
//! The selected [`AuthProvider`] turns request headers into an
//! [`AuthContext`], which the middleware injects into request extensions.
//! No route is protected: a configured publishable key only changes what
//! the context records, never whether a request is served.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

use crate::state::AppState;

/// Which provider the server started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    PublishableKey,
    Anonymous,
}

/// Environment a publishable key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEnvironment {
    Test,
    Live,
    Other,
}

/// Authentication context injected into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub mode: AuthMode,
    /// The request carried a bearer session token. The token is not
    /// verified.
    pub has_session: bool,
}

/// Produces an [`AuthContext`] for each request.
pub trait AuthProvider: Send + Sync + 'static {
    fn mode(&self) -> AuthMode;

    fn authenticate(&self, headers: &HeaderMap) -> AuthContext;
}

/// Provider used when a valid publishable key is configured.
#[derive(Debug, Clone)]
pub struct PublishableKeyAuth {
    key: String,
}

impl PublishableKeyAuth {
    #[must_use]
    pub fn new(key: String) -> Self {
        Self { key }
    }

    /// Environment encoded in the key prefix.
    #[must_use]
    pub fn environment(&self) -> KeyEnvironment {
        if self.key.starts_with("pk_test_") {
            KeyEnvironment::Test
        } else if self.key.starts_with("pk_live_") {
            KeyEnvironment::Live
        } else {
            KeyEnvironment::Other
        }
    }
}

impl AuthProvider for PublishableKeyAuth {
    fn mode(&self) -> AuthMode {
        AuthMode::PublishableKey
    }

    fn authenticate(&self, headers: &HeaderMap) -> AuthContext {
        let has_session = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| !token.trim().is_empty());

        AuthContext {
            mode: AuthMode::PublishableKey,
            has_session,
        }
    }
}

/// Provider used when no usable key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousAuth;

impl AuthProvider for AnonymousAuth {
    fn mode(&self) -> AuthMode {
        AuthMode::Anonymous
    }

    fn authenticate(&self, _headers: &HeaderMap) -> AuthContext {
        AuthContext {
            mode: AuthMode::Anonymous,
            has_session: false,
        }
    }
}

/// Middleware that attaches the [`AuthContext`] to every request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = state.auth.authenticate(req.headers());
    req.extensions_mut().insert(ctx);
    next.run(req).await
}
