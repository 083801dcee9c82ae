//! WebSocket adapters for the real-time telemetry relay.
//!
//! # Architecture
//!
//! ```text
//!  publisher ──frame──► read loop ──on_message──► TelemetryHub
//!                                                     │ snapshot + try_send
//!                         ┌───────────────────────────┼───────────────────┐
//!                         ▼                           ▼                   ▼
//!                    send queue A                send queue B        send queue C
//!                         │                           │                   │
//!                    write loop A                write loop B        write loop C
//!                         ▼                           ▼                   ▼
//!                      viewer A                    viewer B            viewer C
//! ```
//!
//! # Components
//!
//! - [`hub`] - Connection lifecycle and best-effort fan-out
//! - [`handler`] - Axum upgrade handler and per-connection read/write loops

pub mod handler;
pub mod hub;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use hub::{BroadcastReport, TelemetryHub};
