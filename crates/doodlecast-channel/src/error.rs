use doodlecast_protocol::{ProtocolError, SubscriptionId};

/// Errors that can occur in the channel layer.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding, accepting, or connecting failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The other side refused the request.
    #[error("rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// No such subscription on this channel.
    #[error("unknown subscription {0}")]
    UnknownSubscription(SubscriptionId),

    /// The bus has shut down or its command queue is closed.
    #[error("channel unavailable")]
    Unavailable,

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
