//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TELEMETRY_RELAY` prefix and nested values use double underscores as separators.
//! Every value has a default, so the relay starts with no environment at all.
//!
//! # Example
//!
//! ```no_run
//! use telemetry_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Hub listening on {}{}", config.server.socket_addr(), config.hub.ws_path);
//! ```

mod error;
mod hub;
mod server;
mod viewer;

pub use error::{ConfigError, ValidationError};
pub use hub::{HubConfig, MAX_SEND_QUEUE_CAPACITY};
pub use server::{LogFormat, ServerConfig};
pub use viewer::ViewerConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Listener and logging configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Broadcast hub configuration (endpoint path, echo policy, queue sizing)
    #[serde(default)]
    pub hub: HubConfig,

    /// Viewer client configuration
    #[serde(default)]
    pub viewer: ViewerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TELEMETRY_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TELEMETRY_RELAY__SERVER__PORT=9000` -> `server.port = 9000`
    /// - `TELEMETRY_RELAY__HUB__INCLUDE_SENDER=false` -> `hub.include_sender = false`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TELEMETRY_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.hub.validate()?;
        self.viewer.validate()?;
        Ok(())
    }
}
