//! Client half of the relay transport: a [`Channel`] backed by a
//! WebSocket connection to a relay server.
//!
//! A reader task owns the receive side. Replies are matched to requests
//! by `request_id`; `Event` frames are routed to the callback registered
//! for their subscription.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use doodlecast_protocol::{
    ClientFrame, Codec, JsonCodec, ProtocolError, ReplayFrom, ServerFrame,
    SubscriptionId,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Channel, ChannelError, Delivery, MessageCallback, Subscription};

type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where incoming events go.
#[derive(Default)]
struct Routes {
    callbacks: HashMap<SubscriptionId, MessageCallback>,
    /// Events that arrived before their `Subscribed` reply was handled.
    /// The relay sends retained events ahead of the reply.
    early: HashMap<SubscriptionId, Vec<Delivery>>,
    /// Subscribe requests still waiting for a reply.
    subscribing: usize,
}

struct Shared {
    sink: Mutex<SplitSink<ClientStream, Message>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<ServerFrame>>>,
    routes: Mutex<Routes>,
    next_request: AtomicU64,
    closed: AtomicBool,
    codec: JsonCodec,
}

/// A [`Channel`] talking to a relay server over WebSocket.
pub struct WebSocketChannel {
    shared: Arc<Shared>,
    reader: JoinHandle<()>,
}

impl WebSocketChannel {
    /// Connects to a relay at `url`, e.g. `ws://127.0.0.1:8080`.
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                ChannelError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;
        tracing::debug!(url, "connected to relay");

        let (sink, stream) = ws.split();
        let shared = Arc::new(Shared {
            sink: Mutex::new(sink),
            pending: Mutex::new(HashMap::new()),
            routes: Mutex::new(Routes::default()),
            next_request: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            codec: JsonCodec,
        });

        let reader = tokio::spawn(read_loop(Arc::clone(&shared), stream));
        Ok(Self { shared, reader })
    }

    /// True once the relay connection has ended.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Sends a close frame. Pending requests fail with
    /// `ChannelError::ConnectionClosed` once the relay hangs up.
    pub async fn close(&self) -> Result<(), ChannelError> {
        self.shared.sink.lock().await.close().await.map_err(|e| {
            ChannelError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn next_request_id(&self) -> u64 {
        self.shared.next_request.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends `frame` and waits for the reply carrying its request id.
    /// An `Error` reply becomes `ChannelError::Rejected`.
    async fn request(
        &self,
        frame: ClientFrame,
    ) -> Result<ServerFrame, ChannelError> {
        let request_id = frame.request_id();
        let bytes = self.shared.codec.encode(&frame)?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(request_id, tx);

        // The reader clears `pending` after setting `closed`, so a request
        // registered after that point would never be answered.
        if self.is_closed() {
            self.shared.pending.lock().await.remove(&request_id);
            return Err(closed());
        }

        let sent = self
            .shared
            .sink
            .lock()
            .await
            .send(Message::Binary(bytes.into()))
            .await;
        if let Err(e) = sent {
            self.shared.pending.lock().await.remove(&request_id);
            return Err(ChannelError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            )));
        }

        match rx.await.map_err(|_| closed())? {
            ServerFrame::Error { code, message, .. } => {
                Err(ChannelError::Rejected { code, message })
            }
            reply => Ok(reply),
        }
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl Channel for WebSocketChannel {
    fn subscribe(
        &self,
        topic: &str,
        replay_from: ReplayFrom,
        on_message: MessageCallback,
    ) -> impl Future<Output = Result<Subscription, ChannelError>> + Send {
        let topic = topic.to_string();
        async move {
            let request_id = self.next_request_id();
            self.shared.routes.lock().await.subscribing += 1;

            let result = self
                .request(ClientFrame::Subscribe {
                    request_id,
                    topic: topic.clone(),
                    replay_from,
                })
                .await;

            let mut routes = self.shared.routes.lock().await;
            routes.subscribing = routes.subscribing.saturating_sub(1);

            let id = match result {
                Ok(ServerFrame::Subscribed {
                    subscription_id, ..
                }) => subscription_id,
                Ok(other) => {
                    if routes.subscribing == 0 {
                        routes.early.clear();
                    }
                    return Err(unexpected(&other));
                }
                Err(e) => {
                    if routes.subscribing == 0 {
                        routes.early.clear();
                    }
                    return Err(e);
                }
            };

            for delivery in routes.early.remove(&id).unwrap_or_default() {
                on_message(delivery);
            }
            routes.callbacks.insert(id, on_message);
            if routes.subscribing == 0 {
                routes.early.clear();
            }
            drop(routes);

            tracing::debug!(%topic, subscription = %id, %replay_from, "subscribed via relay");
            Ok(Subscription {
                id,
                topic,
                replay_from,
            })
        }
    }

    fn unsubscribe(
        &self,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send {
        let id = subscription.id;
        async move {
            self.shared.routes.lock().await.callbacks.remove(&id);

            let request_id = self.next_request_id();
            match self
                .request(ClientFrame::Unsubscribe {
                    request_id,
                    subscription_id: id,
                })
                .await
            {
                Ok(ServerFrame::Unsubscribed { .. }) => Ok(()),
                Ok(other) => Err(unexpected(&other)),
                Err(ChannelError::Rejected { code: 404, .. }) => {
                    Err(ChannelError::UnknownSubscription(id))
                }
                Err(e) => Err(e),
            }
        }
    }

    fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> impl Future<Output = Result<u64, ChannelError>> + Send {
        let topic = topic.to_string();
        async move {
            let request_id = self.next_request_id();
            match self
                .request(ClientFrame::Publish {
                    request_id,
                    topic,
                    payload,
                })
                .await?
            {
                ServerFrame::Published { replay_id, .. } => Ok(replay_id),
                other => Err(unexpected(&other)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

async fn read_loop(shared: Arc<Shared>, mut stream: SplitStream<ClientStream>) {
    loop {
        let data: Vec<u8> = match stream.next().await {
            Some(Ok(Message::Binary(data))) => data.into(),
            Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "relay connection failed");
                break;
            }
        };

        let frame: ServerFrame = match shared.codec.decode(&data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable relay frame");
                continue;
            }
        };

        match frame {
            ServerFrame::Event {
                subscription_id,
                topic,
                replay_id,
                payload,
            } => {
                let delivery = Delivery {
                    topic,
                    replay_id,
                    payload,
                };
                let mut routes = shared.routes.lock().await;
                if let Some(callback) = routes.callbacks.get(&subscription_id) {
                    callback(delivery);
                } else if routes.subscribing > 0 {
                    routes.early.entry(subscription_id).or_default().push(delivery);
                } else {
                    tracing::debug!(
                        subscription = %subscription_id,
                        "dropping event for unknown subscription"
                    );
                }
            }
            reply => match reply.request_id() {
                Some(request_id) => {
                    if let Some(tx) = shared.pending.lock().await.remove(&request_id) {
                        let _ = tx.send(reply);
                    }
                }
                None => {
                    tracing::warn!(?reply, "relay reported an error");
                }
            },
        }
    }

    shared.closed.store(true, Ordering::SeqCst);
    // Dropping the senders fails every outstanding request.
    shared.pending.lock().await.clear();
    tracing::debug!("relay connection ended");
}

fn closed() -> ChannelError {
    ChannelError::ConnectionClosed("relay connection ended".into())
}

fn unexpected(frame: &ServerFrame) -> ChannelError {
    ChannelError::Protocol(ProtocolError::InvalidMessage(format!(
        "unexpected reply from relay: {frame:?}"
    )))
}
