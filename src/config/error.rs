//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("WebSocket path must start with '/'")]
    InvalidWsPath,

    #[error("Send queue capacity must be between 1 and {max}")]
    InvalidQueueCapacity { max: usize },

    #[error("Shutdown grace period must be at most {max} seconds")]
    InvalidShutdownGrace { max: u64 },

    #[error("Viewer URL must use ws:// or wss://")]
    InvalidViewerUrl,

    #[error("History capacity must be at least 1")]
    InvalidHistoryCapacity,
}
