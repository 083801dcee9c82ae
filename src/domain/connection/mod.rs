//! Connection module - per-peer lifecycle and outbound queue.

mod handle;
mod state;

pub use handle::{ConnectionHandle, ConnectionOutbox};
pub use state::ConnectionState;
