//! Telemetry Relay - real-time sensor telemetry over WebSocket
//!
//! Publishers send JSON readings to a single upgrade endpoint; the hub fans
//! each reading out to every live connection with best-effort, non-blocking
//! delivery.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod observability;
pub mod ports;
