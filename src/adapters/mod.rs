//! Adapters - Implementations of port interfaces and transport bindings.
//!
//! - `registry` - Connection registry implementations
//! - `websocket` - Telemetry hub and the WebSocket connection adapter
//! - `http` - Application router and health endpoint
//! - `viewer` - WebSocket subscriber feeding a dashboard model

pub mod http;
pub mod registry;
pub mod viewer;
pub mod websocket;

pub use registry::InMemoryConnectionRegistry;
pub use viewer::{TelemetryViewer, ViewerError};
pub use websocket::{BroadcastReport, TelemetryHub, WebSocketState};
