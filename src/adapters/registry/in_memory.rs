//! Process-local connection registry.
//!
//! # Thread Safety
//!
//! Uses `RwLock` since snapshots (one per broadcast) vastly outnumber
//! registrations. The lock is never held across a send: broadcasts clone the
//! handle list and release the lock before touching any queue.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::connection::ConnectionHandle;
use crate::domain::foundation::ConnectionId;
use crate::ports::{ConnectionRegistry, ConnectionRegistryError};

/// In-memory [`ConnectionRegistry`] keyed by connection id.
#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionHandle>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, handle: Arc<ConnectionHandle>) -> Result<(), ConnectionRegistryError> {
        let mut connections = self.connections.write().await;
        let id = handle.id();
        if connections.contains_key(&id) {
            return Err(ConnectionRegistryError::Duplicate(id));
        }
        connections.insert(id, handle);
        Ok(())
    }

    async fn unregister(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.write().await.remove(id)
    }

    async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.read().await.values().cloned().collect()
    }

    async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    async fn len(&self) -> usize {
        self.connections.read().await.len()
    }
}
