//! Error types for the board layer.

use doodlecast_canvas::CanvasError;
use doodlecast_channel::ChannelError;
use doodlecast_protocol::ProtocolError;

/// Errors that can occur during board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A received payload could not be decoded. Nothing was drawn.
    #[error("payload decode failed: {0}")]
    Decode(#[source] ProtocolError),

    /// The canvas could not produce a snapshot.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// Subscribing to the drawing topic failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The board actor has stopped.
    #[error("board is unavailable")]
    Unavailable,
}

/// Errors reported by a [`SnapshotStore`](crate::SnapshotStore).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistError {
    /// The store refused the snapshot.
    #[error("snapshot rejected: {0}")]
    Rejected(String),

    /// The store could not be reached.
    #[error("snapshot store unavailable")]
    Unavailable,
}
