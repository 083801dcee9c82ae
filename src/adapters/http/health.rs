//! Liveness endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::adapters::websocket::WebSocketState;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

pub async fn health(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    let status = if state.hub.is_accepting() {
        "ok"
    } else {
        "shutting_down"
    };

    Json(HealthResponse {
        status,
        connections: state.hub.connection_count().await,
    })
}

pub fn health_router() -> Router<WebSocketState> {
    Router::new().route("/health", get(health))
}
