//! Telemetry hub: connection lifecycle and best-effort fan-out.
//!
//! # Broadcast policy
//!
//! Each inbound message is serialized once and offered to every registered
//! connection with a non-blocking `try_send`. A target whose queue is full,
//! or which is already closing, is skipped for that message. Nothing is
//! retried: telemetry is a live stream and late data is stale data.
//!
//! # Ordering
//!
//! A connection's read loop hands messages over one at a time and each
//! target queue is FIFO, so messages from one publisher reach every target in
//! publish order. Messages from different publishers may interleave.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::registry::InMemoryConnectionRegistry;
use crate::config::HubConfig;
use crate::domain::connection::{ConnectionHandle, ConnectionOutbox};
use crate::domain::foundation::{ConnectionId, HubError, SkipReason};
use crate::domain::telemetry::TelemetryMessage;
use crate::ports::{ConnectionRegistry, ConnectionRegistryError};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Targets the frame was queued for.
    pub delivered: usize,
    /// Targets skipped because their queue was full.
    pub skipped_full: usize,
    /// Targets skipped because they were no longer open.
    pub skipped_closed: usize,
}

impl BroadcastReport {
    pub fn skipped(&self) -> usize {
        self.skipped_full + self.skipped_closed
    }

    fn record(&mut self, outcome: Result<(), SkipReason>) {
        match outcome {
            Ok(()) => self.delivered += 1,
            Err(SkipReason::QueueFull) => self.skipped_full += 1,
            Err(SkipReason::NotOpen) => self.skipped_closed += 1,
        }
    }
}

/// Routes telemetry between connections.
///
/// Constructed once at startup and shared by every connection task through
/// `Arc`. Owns the registry it broadcasts to.
///
/// Every handle passed to [`on_connect`](Self::on_connect), accepted or not,
/// must eventually be passed to [`on_closed`](Self::on_closed).
pub struct TelemetryHub {
    registry: Arc<dyn ConnectionRegistry>,
    include_sender: bool,
    send_queue_capacity: usize,
    accepting: AtomicBool,
    /// Handles seen by `on_connect` that have not reached `Closed`.
    live: AtomicUsize,
}

impl TelemetryHub {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, config: &HubConfig) -> Self {
        Self {
            registry,
            include_sender: config.include_sender,
            send_queue_capacity: config.send_queue_capacity,
            accepting: AtomicBool::new(true),
            live: AtomicUsize::new(0),
        }
    }

    /// Hub backed by a fresh in-memory registry.
    pub fn in_memory(config: &HubConfig) -> Self {
        Self::new(Arc::new(InMemoryConnectionRegistry::new()), config)
    }

    pub fn include_sender(&self) -> bool {
        self.include_sender
    }

    pub fn send_queue_capacity(&self) -> usize {
        self.send_queue_capacity
    }

    /// False once [`shutdown`](Self::shutdown) has started.
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Create a handle sized for this hub. It still has to be passed to
    /// [`on_connect`](Self::on_connect) before it receives anything.
    pub fn open_connection(&self) -> (Arc<ConnectionHandle>, ConnectionOutbox) {
        ConnectionHandle::new(self.send_queue_capacity)
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }

    /// Connections whose adapter has not finished cleanup yet.
    ///
    /// Unlike [`connection_count`](Self::connection_count) this includes
    /// handles already unregistered but still `Closing`.
    pub fn live_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Register a freshly upgraded connection and mark it open.
    ///
    /// On failure the handle is left in `Closing` and is not registered.
    pub async fn on_connect(&self, handle: Arc<ConnectionHandle>) -> Result<(), HubError> {
        let id = handle.id();
        self.live.fetch_add(1, Ordering::SeqCst);

        if !self.is_accepting() {
            handle.begin_close();
            return Err(HubError::ShuttingDown);
        }

        if let Err(ConnectionRegistryError::Duplicate(dup)) =
            self.registry.register(handle.clone()).await
        {
            tracing::error!(connection_id = %dup, "Duplicate connection registration");
            handle.begin_close();
            return Err(HubError::DuplicateConnection(dup));
        }

        if let Err(e) = handle.mark_open() {
            self.registry.unregister(&id).await;
            handle.begin_close();
            return Err(e.into());
        }

        // Shutdown may have snapshotted the registry before we were added.
        if !self.is_accepting() {
            self.on_disconnect(&handle).await;
            return Err(HubError::ShuttingDown);
        }

        let connections = self.registry.len().await;
        tracing::info!(connection_id = %id, connections, "Client connected");
        Ok(())
    }

    /// Parse one inbound payload and broadcast it.
    ///
    /// A payload that is not a JSON object yields `MalformedMessage` and no
    /// sends; the source connection is left untouched.
    pub async fn on_message(
        &self,
        source: &ConnectionHandle,
        raw: &[u8],
    ) -> Result<BroadcastReport, HubError> {
        let message = TelemetryMessage::parse(raw)
            .map_err(|e| HubError::malformed(source.id(), e.to_string()))?;

        tracing::debug!(
            connection_id = %source.id(),
            temperature = ?message.temperature(),
            humidity = ?message.humidity(),
            "Received telemetry"
        );

        self.broadcast(Some(source.id()), &message).await
    }

    /// Fan a message out to the current registry snapshot.
    ///
    /// `source` is excluded when the hub is configured without self-echo.
    pub async fn broadcast(
        &self,
        source: Option<ConnectionId>,
        message: &TelemetryMessage,
    ) -> Result<BroadcastReport, HubError> {
        let frame = message.to_json().map_err(|e| {
            HubError::malformed(source.unwrap_or_default(), e.to_string())
        })?;
        Ok(self.broadcast_frame(source, frame).await)
    }

    async fn broadcast_frame(&self, source: Option<ConnectionId>, frame: String) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for target in self.registry.snapshot().await {
            if !self.include_sender && Some(target.id()) == source {
                continue;
            }

            let outcome = target.try_enqueue(frame.clone());
            if let Err(reason) = outcome {
                let skipped = HubError::SendSkipped {
                    connection_id: target.id(),
                    reason,
                };
                tracing::debug!(error = %skipped, "Broadcast target skipped");
            }
            report.record(outcome);
        }

        report
    }

    /// Start closing a connection and drop it from the registry.
    ///
    /// Idempotent: the read loop, the write loop and shutdown may all call
    /// it. Returns `true` only for the call that removed the registry entry.
    pub async fn on_disconnect(&self, handle: &ConnectionHandle) -> bool {
        handle.begin_close();
        let removed = self.registry.unregister(&handle.id()).await.is_some();

        if removed {
            let connections = self.registry.len().await;
            tracing::info!(connection_id = %handle.id(), connections, "Client disconnected");
        }
        removed
    }

    /// Final step once both connection loops have exited.
    pub async fn on_closed(&self, handle: &ConnectionHandle) -> Result<(), HubError> {
        self.on_disconnect(handle).await;
        handle.mark_closed()?;
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        tracing::debug!(
            connection_id = %handle.id(),
            opened_at = %handle.opened_at().to_rfc3339(),
            "Connection closed"
        );
        Ok(())
    }

    /// Stop accepting connections and signal every registered one to close.
    ///
    /// Adapters observe the close signal and run their normal cleanup.
    /// Returns the number of connections signalled.
    pub async fn shutdown(&self) -> usize {
        self.accepting.store(false, Ordering::SeqCst);

        let handles = self.registry.snapshot().await;
        for handle in &handles {
            handle.begin_close();
        }

        tracing::info!(connections = handles.len(), "Hub shutting down");
        handles.len()
    }

    /// Wait until every connection has reached `Closed`.
    ///
    /// Leaving the registry is not enough: the adapter may still be tearing
    /// the socket down. Returns `false` if `timeout` elapsed first.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.live_connections() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await
        .is_ok()
    }
}
