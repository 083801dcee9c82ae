//! WebSocket subscriber that feeds a [`ViewerState`].
//!
//! Mirrors what a browser dashboard does: open one connection, parse each
//! text frame, update the latest reading and the rolling chart, and flip the
//! connection indicator on open and close.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::{watch, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::ViewerConfig;
use crate::domain::telemetry::ViewerState;

/// Errors that end a viewer session.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Headless dashboard bound to one hub endpoint.
pub struct TelemetryViewer {
    url: String,
    state: Arc<RwLock<ViewerState>>,
}

impl TelemetryViewer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            url: config.url.clone(),
            state: Arc::new(RwLock::new(ViewerState::new(config.history_capacity))),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Shared view of the dashboard model.
    pub fn state(&self) -> Arc<RwLock<ViewerState>> {
        self.state.clone()
    }

    /// Connect and consume frames until the server closes the connection or
    /// `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ViewerError> {
        let (socket, _response) = connect_async(self.url.as_str()).await?;
        self.state.write().await.set_connected(true);
        tracing::info!(url = %self.url, "Connected to WebSocket server");

        let (mut write, mut read) = socket.split();

        let result = loop {
            tokio::select! {
                _ = stop_requested(&mut shutdown) => {
                    let _ = write.send(Message::Close(None)).await;
                    break Ok(());
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.apply(&text).await,
                    Some(Ok(Message::Close(_))) | None => break Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(ViewerError::Transport(e)),
                },
            }
        };

        self.state.write().await.set_connected(false);
        tracing::info!(url = %self.url, "Disconnected from WebSocket server");
        result
    }

    async fn apply(&self, text: &str) {
        let mut state = self.state.write().await;
        match state.apply_frame(text) {
            Ok(Some(sample)) => tracing::info!(
                temperature = sample.temperature,
                humidity = sample.humidity,
                at = %sample.timestamp.time_of_day(),
                points = state.history().len(),
                "Reading"
            ),
            Ok(None) => tracing::debug!("Frame without a numeric reading ignored"),
            Err(e) => tracing::warn!(error = %e, "Error parsing WebSocket message"),
        }
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender also ends the session.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
