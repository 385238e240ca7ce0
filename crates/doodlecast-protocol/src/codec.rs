//! Codec trait and implementations for serializing/deserializing frames.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The relay server and the WebSocket client only need something that
//! implements [`Codec`]; they never call `serde_json` directly.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec is shared by every connection
/// task the relay spawns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Relay frames are small and the drawing payload inside them is JSON
/// already, so JSON all the way down keeps frames readable in browser
/// DevTools.
///
/// ## Example
///
/// ```rust
/// use doodlecast_protocol::{ClientFrame, Codec, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let frame = ClientFrame::Publish {
///     request_id: 1,
///     topic: "drawing".into(),
///     payload: "erase".into(),
/// };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: ClientFrame = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerFrame;

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<ServerFrame, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encodes_utf8_json() {
        let bytes = JsonCodec
            .encode(&ServerFrame::Unsubscribed { request_id: 4 })
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"Unsubscribed\""));
    }
}
