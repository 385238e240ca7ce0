//! Wire protocol for Doodlecast.
//!
//! This crate defines everything that travels between peers:
//!
//! - **Stroke model** ([`Point`], [`StrokeEvent`], [`StrokeLog`]): the
//!   replay script a drawing peer accumulates.
//! - **Drawing payload** ([`Payload`]): either a whole stroke log or the
//!   `"erase"` sentinel, plus the tagged-record JSON it is written as.
//! - **Relay frames** ([`ClientFrame`], [`ServerFrame`]): what a WebSocket
//!   client and the relay server say to each other.
//! - **Chat and presence** ([`ChatMessage`], [`PresenceEvent`]): the
//!   side feed that rides on its own topics.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, frames out.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about canvases, sockets, or actors.
//! It only knows how shapes of data look on the wire.
//!
//! ```text
//! Canvas (pixels) ← Board (capture/replay) ← Protocol (Payload) → Channel (topics)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod chat;
mod codec;
mod error;
mod payload;
mod relay;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use chat::{ChatMessage, PresenceEvent};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use payload::{Decoded, Payload, ERASE_SENTINEL};
pub use relay::{ClientFrame, ServerFrame};
pub use types::{Point, ReplayFrom, StrokeEvent, StrokeLog, SubscriptionId};
