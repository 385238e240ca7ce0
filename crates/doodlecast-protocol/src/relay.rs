//! Frames exchanged between a WebSocket client and the relay server.
//!
//! Every client request carries a `request_id`; the server answers with
//! a frame echoing it (`Subscribed`, `Unsubscribed`, `Published`, or
//! `Error`). `Event` frames are pushed without a request and name the
//! subscription they belong to.
//!
//! `#[serde(tag = "type")]` produces internally tagged JSON:
//!
//! ```text
//! { "type": "Publish", "request_id": 3, "topic": "drawing", "payload": "erase" }
//! ```

use serde::{Deserialize, Serialize};

use crate::{ReplayFrom, SubscriptionId};

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// "Send me events from this topic."
    Subscribe {
        request_id: u64,
        topic: String,
        replay_from: ReplayFrom,
    },

    /// "Stop sending me events for this subscription."
    Unsubscribe {
        request_id: u64,
        subscription_id: SubscriptionId,
    },

    /// "Deliver this payload to everyone on the topic."
    Publish {
        request_id: u64,
        topic: String,
        payload: String,
    },
}

impl ClientFrame {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Subscribe { request_id, .. }
            | Self::Unsubscribe { request_id, .. }
            | Self::Publish { request_id, .. } => *request_id,
        }
    }
}

/// Relay → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    Subscribed {
        request_id: u64,
        subscription_id: SubscriptionId,
    },

    Unsubscribed { request_id: u64 },

    /// The payload was accepted and stamped with `replay_id`.
    Published { request_id: u64, replay_id: u64 },

    /// An event on a topic the client subscribed to.
    Event {
        subscription_id: SubscriptionId,
        topic: String,
        replay_id: u64,
        payload: String,
    },

    /// A request failed. `code` follows HTTP conventions (400 bad
    /// request, 404 unknown subscription, 503 bus unavailable).
    /// `request_id` is `None` when the offending frame couldn't be read.
    Error {
        request_id: Option<u64>,
        code: u16,
        message: String,
    },
}

impl ServerFrame {
    /// The request this frame answers, if it answers one.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::Subscribed { request_id, .. }
            | Self::Unsubscribed { request_id }
            | Self::Published { request_id, .. } => Some(*request_id),
            Self::Error { request_id, .. } => *request_id,
            Self::Event { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_json_format() {
        let frame = ClientFrame::Subscribe {
            request_id: 1,
            topic: "drawing".into(),
            replay_from: ReplayFrom::NewOnly,
        };
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "Subscribe");
        assert_eq!(json["topic"], "drawing");
        assert_eq!(json["replay_from"], -1);
    }

    #[test]
    fn test_subscribe_with_bad_replay_position_fails() {
        let raw = r#"{"type":"Subscribe","request_id":1,"topic":"t","replay_from":-5}"#;
        assert!(serde_json::from_str::<ClientFrame>(raw).is_err());
    }

    #[test]
    fn test_event_json_format() {
        let frame = ServerFrame::Event {
            subscription_id: SubscriptionId(2),
            topic: "drawing".into(),
            replay_id: 9,
            payload: "erase".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "Event");
        assert_eq!(json["subscription_id"], 2);
        assert_eq!(json["payload"], "erase");
    }

    #[test]
    fn test_request_ids() {
        let publish = ClientFrame::Publish {
            request_id: 5,
            topic: "chat".into(),
            payload: "{}".into(),
        };
        assert_eq!(publish.request_id(), 5);

        let event = ServerFrame::Event {
            subscription_id: SubscriptionId(1),
            topic: "chat".into(),
            replay_id: 1,
            payload: "{}".into(),
        };
        assert_eq!(event.request_id(), None);

        let error = ServerFrame::Error {
            request_id: Some(8),
            code: 404,
            message: "unknown subscription".into(),
        };
        assert_eq!(error.request_id(), Some(8));
    }

    #[test]
    fn test_unknown_frame_type_fails() {
        let raw = r#"{"type": "FlyToMoon", "request_id": 1}"#;
        assert!(serde_json::from_str::<ClientFrame>(raw).is_err());
    }
}
