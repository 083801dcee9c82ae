//! ConnectionRegistry port - the set of live WebSocket connections.
//!
//! The registry is the only state shared between connection tasks. All
//! mutation and all enumeration go through it, and broadcasts iterate a
//! [`snapshot`](ConnectionRegistry::snapshot) rather than the live set, so a
//! connection joining or leaving mid-broadcast never races the fan-out.
//!
//! ## Lifecycle
//!
//! 1. Adapter completes the upgrade and creates a `ConnectionHandle`
//! 2. Hub registers the handle (`register`)
//! 3. Broadcasts enumerate `snapshot()`
//! 4. On close or error the hub removes it (`unregister`), possibly twice

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::connection::ConnectionHandle;
use crate::domain::foundation::ConnectionId;

/// Errors that can occur in connection registry operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionRegistryError {
    /// A handle with this id is already registered.
    #[error("Connection {0} is already registered")]
    Duplicate(ConnectionId),
}

/// Port for tracking the connections that should receive broadcasts.
///
/// Implementations must:
/// - Reject duplicate ids
/// - Treat removal of an absent id as a no-op
/// - Return snapshots that later mutation cannot affect
///
/// # Example
///
/// ```ignore
/// // On connect:
/// registry.register(handle.clone()).await?;
///
/// // On broadcast:
/// for target in registry.snapshot().await {
///     let _ = target.try_enqueue(frame.clone());
/// }
///
/// // On disconnect (safe to repeat):
/// registry.unregister(&handle.id()).await;
/// ```
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Add a handle.
    async fn register(&self, handle: Arc<ConnectionHandle>) -> Result<(), ConnectionRegistryError>;

    /// Remove a handle, returning it if it was present.
    async fn unregister(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>>;

    /// Point-in-time copy of every registered handle.
    async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>>;

    async fn contains(&self, id: &ConnectionId) -> bool;

    /// Number of registered handles.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
