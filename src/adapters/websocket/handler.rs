//! WebSocket upgrade handler and per-connection loops.
//!
//! Manages the connection lifecycle:
//! 1. Validate the upgrade request (400 / 500 before any handle exists)
//! 2. Upgrade and register with the hub
//! 3. Run the read loop here and the write loop in its own task
//! 4. Either loop failing closes both through the handle's close signal
//! 5. Confirm removal and mark the handle closed

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::stream::SplitStream;
use futures::{Sink, SinkExt, StreamExt};

use crate::domain::connection::{ConnectionHandle, ConnectionOutbox};
use crate::domain::foundation::HubError;

use super::hub::TelemetryHub;

/// How long a closing writer waits for the peer to take the close frame.
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<TelemetryHub>,
}

impl WebSocketState {
    pub fn new(hub: Arc<TelemetryHub>) -> Self {
        Self { hub }
    }
}

/// Handle WebSocket upgrade requests for the telemetry stream.
///
/// Route: `GET /api/ws` (configurable)
pub async fn ws_handler(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<WebSocketState>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            let err = upgrade_rejection(rejection);
            tracing::debug!(error = %err, "Rejected upgrade request");
            return err.into_response();
        }
    };

    if !state.hub.is_accepting() {
        return HubError::ShuttingDown.into_response();
    }

    let hub = state.hub.clone();
    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Create axum router for the WebSocket endpoint at `path`.
pub fn websocket_router(path: &str) -> Router<WebSocketState> {
    Router::new().route(path, get(ws_handler))
}

fn upgrade_rejection(rejection: WebSocketUpgradeRejection) -> HubError {
    match rejection {
        // No upgradable connection underneath: the server, not the client, is at fault.
        WebSocketUpgradeRejection::ConnectionNotUpgradable(inner) => {
            HubError::UpgradeFailed(inner.body_text())
        }
        other => HubError::InvalidUpgradeRequest(other.body_text()),
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code().to_string(),
            })),
        )
            .into_response()
    }
}

/// Drive one established connection until it closes.
async fn handle_socket(mut socket: WebSocket, hub: Arc<TelemetryHub>) {
    let (handle, outbox) = hub.open_connection();
    let connection_id = handle.id();

    if let Err(e) = hub.on_connect(handle.clone()).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Connection rejected");
        let _ = tokio::time::timeout(CLOSE_FRAME_TIMEOUT, socket.send(Message::Close(None))).await;
        finish(&hub, &handle).await;
        return;
    }

    let (sink, stream) = socket.split();

    let writer = tokio::spawn(write_loop(sink, outbox, hub.clone(), handle.clone()));
    read_loop(stream, &hub, &handle).await;

    if let Err(e) = writer.await {
        tracing::error!(connection_id = %connection_id, error = %e, "Write loop aborted");
    }
    finish(&hub, &handle).await;
}

async fn finish(hub: &TelemetryHub, handle: &ConnectionHandle) {
    if let Err(e) = hub.on_closed(handle).await {
        tracing::error!(connection_id = %handle.id(), error = %e, "Connection cleanup failed");
    }
}

/// Receive frames and hand them to the hub until the peer goes away or the
/// connection is told to close.
async fn read_loop(mut stream: SplitStream<WebSocket>, hub: &TelemetryHub, handle: &ConnectionHandle) {
    let connection_id = handle.id();

    loop {
        let frame = tokio::select! {
            _ = handle.closed() => break,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => relay(hub, handle, text.as_bytes()).await,
            Some(Ok(Message::Binary(bytes))) => relay(hub, handle, &bytes).await,
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                // Protocol keepalive - answered by axum
            }
            Some(Ok(Message::Close(_))) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Some(Err(e)) => {
                let err = HubError::transport(connection_id, e);
                tracing::debug!(error = %err, "Receive error");
                break;
            }
            None => break,
        }
    }

    hub.on_disconnect(handle).await;
}

async fn relay(hub: &TelemetryHub, handle: &ConnectionHandle, payload: &[u8]) {
    match hub.on_message(handle, payload).await {
        Ok(report) => tracing::trace!(
            connection_id = %handle.id(),
            delivered = report.delivered,
            skipped = report.skipped(),
            "Broadcast complete"
        ),
        Err(e) => tracing::warn!(error = %e, "Dropping message"),
    }
}

/// Sole writer for one socket: drains the send queue until closed.
///
/// The close signal also interrupts a send in progress, so a peer that has
/// stopped reading cannot hold the connection open.
async fn write_loop<S>(
    mut sink: S,
    mut outbox: ConnectionOutbox,
    hub: Arc<TelemetryHub>,
    handle: Arc<ConnectionHandle>,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    let connection_id = handle.id();

    loop {
        let frame = tokio::select! {
            biased;
            _ = handle.closed() => break,
            frame = outbox.recv() => frame,
        };

        let frame = match frame {
            Some(frame) => frame,
            None => break,
        };

        let sent = tokio::select! {
            biased;
            _ = handle.closed() => {
                tracing::debug!(connection_id = %connection_id, "Close interrupted a pending send");
                break;
            }
            sent = sink.send(Message::Text(frame)) => sent,
        };

        if let Err(e) = sent {
            let err = HubError::transport(connection_id, e);
            tracing::debug!(error = %err, "Send error, closing connection");
            hub.on_disconnect(&handle).await;
            break;
        }
    }

    let dropped = outbox.drain();
    if dropped > 0 {
        tracing::debug!(connection_id = %connection_id, dropped, "Discarded queued frames");
    }

    // Best effort: the peer may already be gone or no longer reading.
    let goodbye = async {
        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    };
    if tokio::time::timeout(CLOSE_FRAME_TIMEOUT, goodbye).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Peer did not take the close frame");
    }
}
