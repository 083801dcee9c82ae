//! Top-level router: WebSocket endpoint, health check, tracing and CORS.

use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::config::AppConfig;

use super::health::health_router;

/// Build the full application router.
///
/// # Example
///
/// ```ignore
/// let hub = Arc::new(TelemetryHub::in_memory(&config.hub));
/// let app = app_router(WebSocketState::new(hub), &config);
/// axum::serve(listener, app).await?;
/// ```
pub fn app_router(state: WebSocketState, config: &AppConfig) -> Router {
    Router::new()
        .merge(websocket_router(&config.hub.ws_path))
        .merge(health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins())),
        )
        .with_state(state)
}

/// Any origin when none are configured, otherwise exactly the configured list.
fn cors_layer(origins: &[&str]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
