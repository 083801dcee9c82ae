//! Error types shared by the hub and its adapters.

use std::fmt;
use thiserror::Error;

use super::ConnectionId;

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot transition from {from} to {to}")]
pub struct TransitionError {
    pub from: String,
    pub to: String,
}

impl TransitionError {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Why a broadcast skipped a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Target's send queue is at capacity.
    QueueFull,
    /// Target is closing or its queue consumer is gone.
    NotOpen,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::QueueFull => write!(f, "send queue full"),
            SkipReason::NotOpen => write!(f, "connection not open"),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Handshake errors
    InvalidUpgradeRequest,
    UpgradeFailed,
    ShuttingDown,

    // Registry errors
    DuplicateConnection,

    // Per-connection errors
    MalformedMessage,
    TransportError,
    SendSkipped,
    InvalidStateTransition,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUpgradeRequest => "INVALID_UPGRADE_REQUEST",
            ErrorCode::UpgradeFailed => "UPGRADE_FAILED",
            ErrorCode::ShuttingDown => "SHUTTING_DOWN",
            ErrorCode::DuplicateConnection => "DUPLICATE_CONNECTION",
            ErrorCode::MalformedMessage => "MALFORMED_MESSAGE",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::SendSkipped => "SEND_SKIPPED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised by the hub and the connection adapter.
///
/// Every variant is local to a single connection or request; none of them
/// alter hub state beyond that connection's own registry entry.
#[derive(Debug, Error)]
pub enum HubError {
    /// Request is not a WebSocket upgrade. No connection is created.
    #[error("Expected websocket: {0}")]
    InvalidUpgradeRequest(String),

    /// Server could not take over the underlying connection.
    #[error("WebSocket upgrade error: {0}")]
    UpgradeFailed(String),

    #[error("Hub is shutting down")]
    ShuttingDown,

    /// Registration reused a live id. Indicates an adapter bug.
    #[error("Connection {0} is already registered")]
    DuplicateConnection(ConnectionId),

    #[error("Malformed message from {connection_id}: {reason}")]
    MalformedMessage {
        connection_id: ConnectionId,
        reason: String,
    },

    #[error("Transport error on {connection_id}: {reason}")]
    TransportError {
        connection_id: ConnectionId,
        reason: String,
    },

    #[error("Send to {connection_id} skipped: {reason}")]
    SendSkipped {
        connection_id: ConnectionId,
        reason: SkipReason,
    },

    #[error(transparent)]
    InvalidStateTransition(#[from] TransitionError),
}

impl HubError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HubError::InvalidUpgradeRequest(_) => ErrorCode::InvalidUpgradeRequest,
            HubError::UpgradeFailed(_) => ErrorCode::UpgradeFailed,
            HubError::ShuttingDown => ErrorCode::ShuttingDown,
            HubError::DuplicateConnection(_) => ErrorCode::DuplicateConnection,
            HubError::MalformedMessage { .. } => ErrorCode::MalformedMessage,
            HubError::TransportError { .. } => ErrorCode::TransportError,
            HubError::SendSkipped { .. } => ErrorCode::SendSkipped,
            HubError::InvalidStateTransition(_) => ErrorCode::InvalidStateTransition,
        }
    }

    pub fn malformed(connection_id: ConnectionId, reason: impl Into<String>) -> Self {
        HubError::MalformedMessage {
            connection_id,
            reason: reason.into(),
        }
    }

    pub fn transport(connection_id: ConnectionId, reason: impl fmt::Display) -> Self {
        HubError::TransportError {
            connection_id,
            reason: reason.to_string(),
        }
    }

    /// Client-side fault (4xx family).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HubError::InvalidUpgradeRequest(_) | HubError::MalformedMessage { .. }
        )
    }
}
