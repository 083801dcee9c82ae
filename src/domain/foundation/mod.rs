//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait and the
//! error types that form the vocabulary of the telemetry relay.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, HubError, SkipReason, TransitionError};
pub use ids::ConnectionId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
