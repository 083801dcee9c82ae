//! Per-connection handle: identity, lifecycle state, send queue and close signal.
//!
//! The handle is shared (`Arc`) between the adapter that owns the socket and
//! the registry. The queue's consumer half, [`ConnectionOutbox`], is owned by
//! the connection's write loop alone, so writes to one socket never interleave.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::domain::foundation::{
    ConnectionId, SkipReason, StateMachine, Timestamp, TransitionError,
};

use super::ConnectionState;

/// Shared half of a connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    state: AtomicU8,
    outbound: mpsc::Sender<String>,
    close_signal: watch::Sender<bool>,
    opened_at: Timestamp,
}

/// Consumer half of a connection's send queue.
#[derive(Debug)]
pub struct ConnectionOutbox {
    id: ConnectionId,
    frames: mpsc::Receiver<String>,
}

impl ConnectionHandle {
    /// Create a handle in `Connecting` with a bounded send queue.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(queue_capacity: usize) -> (Arc<Self>, ConnectionOutbox) {
        Self::with_id(ConnectionId::new(), queue_capacity)
    }

    pub fn with_id(id: ConnectionId, queue_capacity: usize) -> (Arc<Self>, ConnectionOutbox) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let (close_signal, _) = watch::channel(false);

        let handle = Arc::new(Self {
            id,
            state: AtomicU8::new(ConnectionState::Connecting.as_u8()),
            outbound: tx,
            close_signal,
            opened_at: Timestamp::now(),
        });

        (handle, ConnectionOutbox { id, frames: rx })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    /// Atomically move to `target`, returning the previous state.
    pub fn transition(&self, target: ConnectionState) -> Result<ConnectionState, TransitionError> {
        let mut current = self.state();
        loop {
            current.transition_to(target)?;
            match self.state.compare_exchange(
                current.as_u8(),
                target.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(current),
                Err(actual) => current = ConnectionState::from_u8(actual),
            }
        }
    }

    pub fn mark_open(&self) -> Result<(), TransitionError> {
        self.transition(ConnectionState::Open).map(|_| ())
    }

    /// Enter `Closing` and fire the close signal.
    ///
    /// Returns `true` only for the call that performed the transition; later
    /// calls (from the other loop, or a force-close) are no-ops.
    pub fn begin_close(&self) -> bool {
        match self.transition(ConnectionState::Closing) {
            Ok(_) => {
                self.close_signal.send_replace(true);
                true
            }
            Err(_) => false,
        }
    }

    pub fn mark_closed(&self) -> Result<(), TransitionError> {
        self.transition(ConnectionState::Closed).map(|_| ())
    }

    /// Non-blocking enqueue of one outbound text frame.
    pub fn try_enqueue(&self, frame: String) -> Result<(), SkipReason> {
        if !self.is_open() {
            return Err(SkipReason::NotOpen);
        }
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SkipReason::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SkipReason::NotOpen,
        })
    }

    /// Frames currently waiting in the send queue.
    pub fn queued(&self) -> usize {
        self.outbound.max_capacity() - self.outbound.capacity()
    }

    pub fn is_close_signalled(&self) -> bool {
        *self.close_signal.borrow()
    }

    /// Resolves once [`begin_close`](Self::begin_close) has fired.
    pub async fn closed(&self) {
        let mut rx = self.close_signal.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl ConnectionOutbox {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next queued frame; `None` once the queue is closed and empty.
    pub async fn recv(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.frames.try_recv().ok()
    }

    /// Close the queue and discard whatever is still in it.
    pub fn drain(&mut self) -> usize {
        self.frames.close();
        let mut dropped = 0;
        while self.frames.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}
