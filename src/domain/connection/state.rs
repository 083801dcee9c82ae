//! Connection lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of one WebSocket connection.
///
/// ```text
/// Connecting ──► Open ──► Closing ──► Closed
///      └──────────────────►┘
/// ```
///
/// Every path to `Closed` passes through `Closing`, which is where cleanup
/// (registry removal, queue drain) happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionState {
    /// Handle created, not yet registered with the hub.
    Connecting = 0,
    /// Registered and receiving broadcasts.
    Open = 1,
    /// First of read error, write error or explicit close observed.
    Closing = 2,
    /// Both loops exited and registry removal confirmed.
    Closed = 3,
}

impl ConnectionState {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Connecting, Open) | (Connecting, Closing) | (Open, Closing) | (Closing, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Connecting => vec![Open, Closing],
            Open => vec![Closing],
            Closing => vec![Closed],
            Closed => vec![],
        }
    }
}
