//! Server error types.

use scrawl_core::GameError;
use scrawl_proto::ProtocolError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur in the server.
///
/// None of these is fatal to the coordinator: every error is recovered at
/// single-event granularity and reported back only to the invoking
/// participant.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A game operation was rejected (invalid phase, unknown room, or
    /// malformed event content).
    #[error("{0}")]
    Game(#[from] GameError),

    /// An inbound frame failed to decode or an outbound one to encode.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// The room store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Transport/network failure (bind error, I/O error).
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use scrawl_core::Phase;

    use super::*;

    #[test]
    fn game_error_display_passes_through() {
        let err = ServerError::Game(GameError::RoomNotFound("abc".to_string()));
        assert_eq!(err.to_string(), "room not found: abc");

        let err = ServerError::Game(GameError::InvalidState {
            phase: Phase::Lobby,
            operation: "guess outside an active turn",
        });
        assert!(err.to_string().contains("guess outside an active turn"));
    }
}
