//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the hub and its infrastructure. Adapters implement these ports.
//!
//! - `ConnectionRegistry` - Set of live connections the hub broadcasts to

mod connection_registry;

pub use connection_registry::{ConnectionRegistry, ConnectionRegistryError};
