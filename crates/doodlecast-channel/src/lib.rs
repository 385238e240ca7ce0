//! Publish/subscribe channel layer for Doodlecast.
//!
//! Provides the [`Channel`] trait the drawing board publishes through and
//! subscribes to, plus two implementations:
//!
//! - [`EventBus`]: an in-process bus running as a Tokio actor.
//! - [`WebSocketChannel`]: a client of the relay server, speaking
//!   [`ClientFrame`](doodlecast_protocol::ClientFrame)s over WebSocket.
//!
//! The server half of the relay transport ([`RelayListener`],
//! [`RelayConnection`]) also lives here; the relay loop itself is in the
//! `doodlecast` crate.
//!
//! # Delivery model
//!
//! Channels promise at-least-once delivery of opaque string payloads on a
//! named topic. Nothing is promised about ordering across publishers.
//!
//! # Feature Flags
//!
//! - `websocket` (default): relay transport via `tokio-tungstenite`

mod bus;
#[cfg(feature = "websocket")]
mod client;
mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use bus::{BusConfig, BusStats, EventBus};
#[cfg(feature = "websocket")]
pub use client::WebSocketChannel;
pub use error::ChannelError;
#[cfg(feature = "websocket")]
pub use websocket::{RelayConnection, RelayListener};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use doodlecast_protocol::{ReplayFrom, SubscriptionId};

/// One event handed to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    /// Stamped by the channel on publish; increases monotonically.
    pub replay_id: u64,
    pub payload: String,
}

/// The callback a subscriber registers.
///
/// Called on the channel's own task, so it should only hand the delivery
/// off (e.g. into an mpsc queue) and return.
pub type MessageCallback = Arc<dyn Fn(Delivery) + Send + Sync>;

/// A live subscription, as returned by [`Channel::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub topic: String,
    pub replay_from: ReplayFrom,
}

/// A named-topic publish/subscribe channel.
///
/// Methods return `Send` futures so callers can run them on spawned tasks
/// without holding up whoever is drawing.
pub trait Channel: Send + Sync + 'static {
    /// Registers `on_message` for events on `topic`, starting at
    /// `replay_from`. Retained events selected by `replay_from` are
    /// delivered before any new ones.
    fn subscribe(
        &self,
        topic: &str,
        replay_from: ReplayFrom,
        on_message: MessageCallback,
    ) -> impl Future<Output = Result<Subscription, ChannelError>> + Send;

    /// Stops deliveries for `subscription`.
    fn unsubscribe(
        &self,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Publishes `payload` on `topic` and returns its replay id once the
    /// channel has accepted it.
    fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> impl Future<Output = Result<u64, ChannelError>> + Send;
}

impl<C: Channel> Channel for Arc<C> {
    fn subscribe(
        &self,
        topic: &str,
        replay_from: ReplayFrom,
        on_message: MessageCallback,
    ) -> impl Future<Output = Result<Subscription, ChannelError>> + Send {
        C::subscribe(self, topic, replay_from, on_message)
    }

    fn unsubscribe(
        &self,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send {
        C::unsubscribe(self, subscription)
    }

    fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> impl Future<Output = Result<u64, ChannelError>> + Send {
        C::publish(self, topic, payload)
    }
}

/// Opaque identifier for a relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_delivery_clone_is_equal() {
        let delivery = Delivery {
            topic: "drawing".into(),
            replay_id: 3,
            payload: "erase".into(),
        };
        assert_eq!(delivery.clone(), delivery);
    }
}
