//! Protocol error types.

use thiserror::Error;

/// Errors from encoding or decoding wire events.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Inbound text was not a valid event.
    ///
    /// Covers both invalid JSON and JSON missing required fields. Malformed
    /// events are rejected with a local error response and never mutate room
    /// state.
    #[error("malformed event: {0}")]
    Malformed(String),

    /// An outbound event failed to serialize.
    ///
    /// Should never happen for the event types in this crate; indicates a
    /// bug if it does.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
