//! Scrawl production server.
//!
//! Production server for the scrawl drawing-and-guessing game: an axum
//! WebSocket gateway in front of the room session coordinator, using Tokio
//! for the async runtime and system time with cryptographic RNG.
//!
//! # Architecture
//!
//! This crate provides the glue around [`scrawl_core`]'s action-based room
//! state machine. The [`Coordinator`] serializes all mutations to a given
//! room behind that room's own lock (two rooms never contend), executes the
//! state machine's effects through the [`BroadcastBus`], and lets the
//! [`TurnScheduler`] feed turn expirations back in, tagged with the
//! generation captured at schedule time.
//!
//! # Components
//!
//! - [`Coordinator`]: per-room orchestration (join/leave/turns/guesses)
//! - [`BroadcastBus`]: per-recipient buffered fan-out to connections
//! - [`TurnScheduler`]: generation-tagged turn-expiry timers
//! - [`RoomStore`]: last-write-wins room/membership persistence boundary
//! - [`gateway`]: axum WebSocket endpoint (one task per connection)
//! - [`SystemEnv`]: production environment (real time, crypto RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod coordinator;
mod error;
pub mod gateway;
mod scheduler;
mod store;
mod system_env;

pub use bus::BroadcastBus;
pub use coordinator::{Coordinator, ServerConfig};
pub use error::ServerError;
pub use scheduler::{TurnExpired, TurnScheduler};
pub use store::{MemberRecord, MemoryRoomStore, RoomRecord, RoomStore, StoreError};
pub use system_env::SystemEnv;
