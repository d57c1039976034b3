//! Core game logic for the scrawl drawing-and-guessing game.
//!
//! This crate holds the pure, I/O-free parts of the system: the room turn
//! state machine, guess evaluation, and word selection. It follows the
//! action pattern: state machine methods return [`room::RoomEffect`] values
//! describing the deliveries and timers the runtime must execute. This keeps
//! the logic synchronous and directly testable - the server crate owns the
//! async plumbing.
//!
//! # Components
//!
//! - [`room::RoomState`]: per-room membership and turn state machine
//! - [`guess`]: pure guess-against-secret-word evaluation
//! - [`word_bank::WordBank`]: word selection strategy seam
//! - [`env::Environment`]: time/RNG abstraction for deterministic testing

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod guess;
pub mod room;
pub mod word_bank;

pub use env::Environment;
pub use error::GameError;
pub use room::{ConnectionId, Participant, Phase, RoomEffect, RoomState};
pub use word_bank::{CatalogWordBank, WordBank, WordChoice};
