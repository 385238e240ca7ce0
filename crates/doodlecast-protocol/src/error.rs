//! Error types for the protocol layer.
//!
//! Each crate in Doodlecast defines its own error enum. When you see a
//! `ProtocolError`, the problem is in the shape of the data, not in the
//! network or the canvas.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, a top-level value that is not a
    /// record array, or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The data parsed but breaks a protocol rule, e.g. a stroke log
    /// with a `Segment` outside any stroke.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A replay position that is neither `-1`, `-2`, nor a replay id.
    #[error("invalid replay position: {0}")]
    InvalidReplayPosition(i64),
}
