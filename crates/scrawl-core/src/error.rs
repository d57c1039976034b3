//! Error types for game operations.
//!
//! No error here is fatal to the coordinator: all are recovered at
//! single-event granularity. `InvalidState` and `Malformed` are reported
//! back to the invoking participant only, never broadcast.

use thiserror::Error;

use crate::room::Phase;

/// Errors from room operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Operation not valid for the room's current phase.
    ///
    /// For example guessing before a game starts, or drawing from a
    /// participant who is not the recorded drawer. Leaves room state
    /// unchanged.
    #[error("invalid state: cannot {operation} while {phase:?}")]
    InvalidState {
        /// Phase the room was in when the operation was attempted.
        phase: Phase,
        /// The attempted operation.
        operation: &'static str,
    },

    /// A referenced room does not exist.
    ///
    /// Rooms are created lazily on first join; any other operation against
    /// an unknown room name lands here.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// An inbound event was structurally invalid (e.g. empty identifier).
    ///
    /// Rejected with a local error response; never broadcast, never mutates
    /// state.
    #[error("malformed event: {0}")]
    Malformed(String),
}
