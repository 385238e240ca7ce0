//! Server half of the relay transport, using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{ChannelError, ConnectionId};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Listens for relay clients.
pub struct RelayListener {
    listener: TcpListener,
}

impl RelayListener {
    /// Binds to `addr`. Use port 0 to let the OS pick one.
    pub async fn bind(addr: &str) -> Result<Self, ChannelError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(ChannelError::AcceptFailed)?;
        tracing::info!(addr, "relay listening");
        Ok(Self { listener })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
        self.listener.local_addr().map_err(ChannelError::AcceptFailed)
    }

    /// Waits for the next client and completes the WebSocket handshake.
    pub async fn accept(&self) -> Result<RelayConnection, ChannelError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(ChannelError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| {
                ChannelError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted relay connection");

        let (sink, stream) = ws.split();
        Ok(RelayConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// One accepted relay client.
///
/// The socket is split so a pending `recv` never blocks a `send` from
/// another task.
pub struct RelayConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl RelayConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends one binary frame.
    pub async fn send(&self, data: &[u8]) -> Result<(), ChannelError> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            ChannelError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    /// Next binary or text frame. `None` once the client has gone away.
    pub async fn recv(&self) -> Result<Option<Vec<u8>>, ChannelError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(ChannelError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    pub async fn close(&self) -> Result<(), ChannelError> {
        self.sink.lock().await.close().await.map_err(|e| {
            ChannelError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}
