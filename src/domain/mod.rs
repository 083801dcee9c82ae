//! Domain layer containing the relay's core types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, state machine, errors)
//! - `connection` - Connection lifecycle and per-connection send queue
//! - `telemetry` - Telemetry payloads and the viewer-side rolling history

pub mod connection;
pub mod foundation;
pub mod telemetry;
