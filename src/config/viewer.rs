//! Viewer client configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::telemetry::DEFAULT_HISTORY_CAPACITY;

/// Configuration for the `telemetry-viewer` client
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Hub endpoint to subscribe to
    #[serde(default = "default_url")]
    pub url: String,

    /// Points kept in the rolling chart
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl ViewerConfig {
    /// Validate viewer configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ValidationError::InvalidViewerUrl);
        }
        if self.history_capacity == 0 {
            return Err(ValidationError::InvalidHistoryCapacity);
        }
        Ok(())
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:8080/api/ws".to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
