//! Unified error type for Doodlecast.

use doodlecast_board::{BoardError, PersistError};
use doodlecast_canvas::CanvasError;
use doodlecast_channel::ChannelError;
use doodlecast_protocol::ProtocolError;

use crate::ChatError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DoodlecastError {
    /// Encoding or decoding a payload or frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The canvas could not produce a snapshot.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// A channel-level error (connection, publish, subscribe).
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A board-level error (decode, unavailable actor).
    #[error(transparent)]
    Board(#[from] BoardError),

    /// A snapshot could not be persisted.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A chat message was refused.
    #[error(transparent)]
    Chat(#[from] ChatError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_channel_error() {
        let err = ChannelError::ConnectionClosed("gone".into());
        let doodlecast_err: DoodlecastError = err.into();
        assert!(matches!(doodlecast_err, DoodlecastError::Channel(_)));
        assert!(doodlecast_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let doodlecast_err: DoodlecastError = err.into();
        assert!(matches!(doodlecast_err, DoodlecastError::Protocol(_)));
    }

    #[test]
    fn test_from_board_error() {
        let doodlecast_err: DoodlecastError = BoardError::Unavailable.into();
        assert!(matches!(doodlecast_err, DoodlecastError::Board(_)));
    }

    #[test]
    fn test_from_persist_error() {
        let doodlecast_err: DoodlecastError = PersistError::Unavailable.into();
        assert!(matches!(doodlecast_err, DoodlecastError::Persist(_)));
    }

    #[test]
    fn test_from_chat_error() {
        let doodlecast_err: DoodlecastError = ChatError::EmptyMessage.into();
        assert!(matches!(doodlecast_err, DoodlecastError::Chat(_)));
        assert_eq!(doodlecast_err.to_string(), "message is empty");
    }
}
