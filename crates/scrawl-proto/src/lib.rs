//! Wire protocol for the scrawl drawing game.
//!
//! Events are JSON text frames tagged by an `action` field. Inbound events
//! ([`ClientEvent`]) are decoded by the gateway and forwarded to the
//! coordinator; outbound events ([`ServerEvent`]) are produced by the
//! coordinator and fanned out to room members.
//!
//! The server never interprets stroke payloads - `drawing` fields are opaque
//! strings relayed verbatim.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod event;

pub use error::ProtocolError;
pub use event::{ClientEvent, ServerEvent};
