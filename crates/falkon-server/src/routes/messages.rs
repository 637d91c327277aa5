//! Contact message routes: `/v1/messages`
//!
//! `POST` appends a message and returns its id; `GET` lists every message,
//! newest first. Listing carries no extra access control.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::Serialize;
use tracing::debug;

use falkon_core::message::{Message, MessageId, NewMessage};

use crate::auth::AuthContext;
use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/messages` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/messages", post(send_message).get(get_all_messages))
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub id: MessageId,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Append a contact message.
async fn send_message(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<SendMessageResponse>), AppError> {
    let Json(new) = body?;
    let id = state.messages.send_message(new).await?;
    Ok((StatusCode::CREATED, Json(SendMessageResponse { id })))
}

/// List all contact messages, most recent first.
async fn get_all_messages(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MessageListResponse>, AppError> {
    let messages = state.messages.get_all_messages().await?;
    debug!(
        count = messages.len(),
        mode = ?auth.mode,
        has_session = auth.has_session,
        "messages listed"
    );
    Ok(Json(MessageListResponse { messages }))
}
