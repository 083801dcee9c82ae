//! Broadcast hub configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on a single connection's send queue.
pub const MAX_SEND_QUEUE_CAPACITY: usize = 4096;

const MAX_SHUTDOWN_GRACE_SECS: u64 = 300;

/// Hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Path of the WebSocket upgrade endpoint
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Echo each message back to its publisher
    #[serde(default = "default_include_sender")]
    pub include_sender: bool,

    /// Frames buffered per connection before broadcasts skip it
    #[serde(default = "default_send_queue_capacity")]
    pub send_queue_capacity: usize,

    /// How long shutdown waits for connections to finish cleanup
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl HubConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Validate hub configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.ws_path.starts_with('/') {
            return Err(ValidationError::InvalidWsPath);
        }
        if self.send_queue_capacity == 0 || self.send_queue_capacity > MAX_SEND_QUEUE_CAPACITY {
            return Err(ValidationError::InvalidQueueCapacity {
                max: MAX_SEND_QUEUE_CAPACITY,
            });
        }
        if self.shutdown_grace_secs > MAX_SHUTDOWN_GRACE_SECS {
            return Err(ValidationError::InvalidShutdownGrace {
                max: MAX_SHUTDOWN_GRACE_SECS,
            });
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ws_path: default_ws_path(),
            include_sender: default_include_sender(),
            send_queue_capacity: default_send_queue_capacity(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_ws_path() -> String {
    "/api/ws".to_string()
}

fn default_include_sender() -> bool {
    true
}

fn default_send_queue_capacity() -> usize {
    64
}

fn default_shutdown_grace_secs() -> u64 {
    5
}
