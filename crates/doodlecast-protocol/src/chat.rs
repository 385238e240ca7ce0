//! Chat and presence messages.
//!
//! These ride on their own topics, independent of the drawing topic.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// One chat line as published on the chat topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    /// Milliseconds since the Unix epoch, stamped by the sender.
    pub sent_at: u64,
}

impl ChatMessage {
    /// # Errors
    /// Returns `ProtocolError::Encode` if JSON serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// # Errors
    /// Returns `ProtocolError::Decode` if `raw` isn't a chat message.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(ProtocolError::Decode)
    }
}

/// A user joining or leaving the board, as published on the presence topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PresenceEvent {
    Connected { user: String },
    Disconnected { user: String },
}

impl PresenceEvent {
    pub fn user(&self) -> &str {
        match self {
            Self::Connected { user } | Self::Disconnected { user } => user,
        }
    }

    /// # Errors
    /// Returns `ProtocolError::Encode` if JSON serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// # Errors
    /// Returns `ProtocolError::Decode` if `raw` isn't a presence event.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_json_format() {
        let msg = ChatMessage {
            sender: "mina".into(),
            text: "is it a cat?".into(),
            sent_at: 1_718_000_000_000,
        };
        let json: serde_json::Value =
            serde_json::from_str(&msg.encode().unwrap()).unwrap();

        assert_eq!(json["sender"], "mina");
        assert_eq!(json["sentAt"], 1_718_000_000_000_u64);
    }

    #[test]
    fn test_presence_json_format() {
        let event = PresenceEvent::Connected { user: "jun".into() };
        let json: serde_json::Value =
            serde_json::from_str(&event.encode().unwrap()).unwrap();

        assert_eq!(json["type"], "connected");
        assert_eq!(json["user"], "jun");
    }

    #[test]
    fn test_presence_decode_rejects_unknown_type() {
        assert!(PresenceEvent::decode(r#"{"type":"away","user":"x"}"#).is_err());
    }
}
