//! System routes: `/v1/sys/*`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::AuthMode;
use crate::state::AppState;

/// Build the `/v1/sys` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/sys/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageStatus {
    Attached,
    Detached,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub auth: AuthMode,
    pub storage: StorageStatus,
    pub version: &'static str,
}

/// Report liveness and which capabilities were detected at startup.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let storage = if state.messages.is_attached() {
        StorageStatus::Attached
    } else {
        StorageStatus::Detached
    };

    Json(HealthResponse {
        status: "ok",
        auth: state.auth.mode(),
        storage,
        version: env!("CARGO_PKG_VERSION"),
    })
}
