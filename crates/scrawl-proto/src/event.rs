//! Client and server event types.
//!
//! The payload type is determined by the `action` tag, so decoding an
//! unknown action fails outright rather than falling through to a default
//! variant. Field names match the wire protocol (`username`, `user_id`,
//! `drawing`, `drawer`).
//!
//! # Invariants
//!
//! - Action Uniqueness: each variant maps to exactly one `action` tag.
//! - The secret word appears only in [`ServerEvent::NewWord`], which is
//!   delivered to the drawer alone, never room-broadcast.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Events sent by a client to the server.
///
/// Every inbound event is scoped to exactly one room, identified by the
/// connection's room binding (the room name is carried in the WebSocket URL,
/// not in the event body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join the room bound to this connection. Idempotent per `user_id`.
    Join {
        /// Human-readable display name.
        username: String,
        /// Opaque client-supplied identifier, unique within the room.
        user_id: String,
    },

    /// Start the game: first member in join order becomes the drawer.
    StartGame,

    /// A drawing stroke from the current drawer, relayed verbatim.
    Drawing {
        /// Opaque stroke payload. The server never interprets it.
        drawing: String,
        /// User id of the sender, which must match the recorded drawer.
        drawer: String,
    },

    /// A guess at the current secret word.
    Guess {
        /// Display name of the guesser.
        username: String,
        /// User id of the guesser.
        user_id: String,
        /// The guessed text.
        guess: String,
    },

    /// Explicitly end the current turn and rotate the drawer.
    NextTurn,
}

/// Events produced by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The secret word and drawing hints for a new turn.
    ///
    /// Addressed privately to the drawer only - guessers must never
    /// receive this event.
    NewWord {
        /// The secret word to draw.
        word: String,
        /// Ordered human-readable drawing-step hints.
        steps: Vec<String>,
    },

    /// A drawing stroke, room-broadcast.
    Draw {
        /// Opaque stroke payload, relayed verbatim.
        drawing: String,
        /// User id of the drawer.
        drawer: String,
    },

    /// A guess echoed to the room as chat, emitted for every guess.
    ChatMessage {
        /// Display name of the guesser.
        username: String,
        /// The guessed text.
        message: String,
    },

    /// A correct guess, room-broadcast in addition to the chat message.
    CorrectGuess {
        /// Display name of the guesser.
        username: String,
        /// The winning guess text.
        guess: String,
    },

    /// A new turn started. Carries the drawer identity only, no word.
    Turn {
        /// User id of the new drawer.
        drawer: String,
    },

    /// Clear the canvas for a new turn.
    ClearCanvas,

    /// Membership changed, room-broadcast.
    UserCount {
        /// Current member count.
        user_count: u32,
    },

    /// The drawer rotation completed a full lap; the game is over.
    GameEnd,

    /// An error reported back to the invoking participant only.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientEvent {
    /// Decode an inbound text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerEvent {
    /// Encode for the wire.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode an outbound event (used by clients and tests).
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_join() {
        let event = ClientEvent::decode(
            r#"{"action":"join","username":"alice","user_id":"u-1"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Join { username: "alice".to_string(), user_id: "u-1".to_string() }
        );
    }

    #[test]
    fn decode_guess() {
        let event = ClientEvent::decode(
            r#"{"action":"guess","username":"bob","user_id":"u-2","guess":"dog"}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::Guess { guess, .. } if guess == "dog"));
    }

    #[test]
    fn decode_unknown_action_fails() {
        let result = ClientEvent::decode(r#"{"action":"teleport"}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn decode_missing_field_fails() {
        // join without user_id must be rejected, not defaulted
        let result = ClientEvent::decode(r#"{"action":"join","username":"alice"}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn decode_invalid_json_fails() {
        assert!(ClientEvent::decode("not json").is_err());
    }

    #[test]
    fn encode_turn_carries_drawer_only() {
        let encoded = ServerEvent::Turn { drawer: "u-1".to_string() }.encode().unwrap();
        assert_eq!(encoded, r#"{"action":"turn","drawer":"u-1"}"#);
        assert!(!encoded.contains("word"));
    }

    #[test]
    fn encode_new_word() {
        let event = ServerEvent::NewWord {
            word: "dog".to_string(),
            steps: vec!["Step 1: Draw the dog".to_string()],
        };
        let decoded = ServerEvent::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn encode_unit_variants() {
        assert_eq!(ServerEvent::ClearCanvas.encode().unwrap(), r#"{"action":"clear_canvas"}"#);
        assert_eq!(ServerEvent::GameEnd.encode().unwrap(), r#"{"action":"game_end"}"#);
    }
}
