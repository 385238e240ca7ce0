//! Per-connection handler: frame decoding and routing onto the bus.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that drains the outbound queue onto the socket
//!   2. Loop: receive `ClientFrame`s → subscribe / unsubscribe / publish
//!   3. On close, drop every subscription the connection still holds
//!
//! Replies and events share one outbound queue, so a `Subscribed` reply
//! always reaches the client before the events of that subscription.

use std::collections::HashMap;
use std::sync::Arc;

use doodlecast_channel::{
    Channel, ChannelError, ConnectionId, Delivery, EventBus, MessageCallback,
    RelayConnection, Subscription,
};
use doodlecast_protocol::{
    ClientFrame, Codec, JsonCodec, ReplayFrom, ServerFrame, SubscriptionId,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::DoodlecastError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: RelayConnection,
    bus: EventBus,
) -> Result<(), DoodlecastError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), outbound_rx));

    let mut session = RelaySession {
        conn_id,
        bus,
        outbound,
        subscriptions: HashMap::new(),
    };

    let result = loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break Err(e.into());
            }
        };

        match JsonCodec.decode::<ClientFrame>(&data) {
            Ok(frame) => session.dispatch(frame).await,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                session.reply(ServerFrame::Error {
                    request_id: None,
                    code: 400,
                    message: e.to_string(),
                });
            }
        }
    };

    session.close().await;
    writer.abort();
    result
}

/// Drains the outbound queue onto the socket until either side goes away.
async fn write_loop(
    conn: Arc<RelayConnection>,
    mut outbound: mpsc::UnboundedReceiver<ServerFrame>,
) {
    while let Some(frame) = outbound.recv().await {
        let bytes = match JsonCodec.encode(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "failed to encode frame");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed");
            break;
        }
    }
}

/// A subscription held on behalf of the client, plus the task that turns
/// its deliveries into `Event` frames.
struct Forwarded {
    subscription: Subscription,
    forwarder: JoinHandle<()>,
}

/// What one connection has open on the bus.
struct RelaySession {
    conn_id: ConnectionId,
    bus: EventBus,
    outbound: mpsc::UnboundedSender<ServerFrame>,
    subscriptions: HashMap<SubscriptionId, Forwarded>,
}

impl RelaySession {
    async fn dispatch(&mut self, frame: ClientFrame) {
        match frame {
            ClientFrame::Subscribe {
                request_id,
                topic,
                replay_from,
            } => self.subscribe(request_id, &topic, replay_from).await,

            ClientFrame::Unsubscribe {
                request_id,
                subscription_id,
            } => self.unsubscribe(request_id, subscription_id).await,

            ClientFrame::Publish {
                request_id,
                topic,
                payload,
            } => match self.bus.publish(&topic, payload).await {
                Ok(replay_id) => self.reply(ServerFrame::Published {
                    request_id,
                    replay_id,
                }),
                Err(e) => self.reject(request_id, &e),
            },
        }
    }

    async fn subscribe(
        &mut self,
        request_id: u64,
        topic: &str,
        replay_from: ReplayFrom,
    ) {
        let (tx, mut deliveries) = mpsc::unbounded_channel::<Delivery>();
        let on_message: MessageCallback = Arc::new(move |delivery| {
            let _ = tx.send(delivery);
        });

        let subscription =
            match self.bus.subscribe(topic, replay_from, on_message).await {
                Ok(subscription) => subscription,
                Err(e) => return self.reject(request_id, &e),
            };
        let subscription_id = subscription.id;

        // Retained events are already waiting in `deliveries`; the reply
        // has to be queued before the forwarder starts.
        self.reply(ServerFrame::Subscribed {
            request_id,
            subscription_id,
        });

        let outbound = self.outbound.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(delivery) = deliveries.recv().await {
                let event = ServerFrame::Event {
                    subscription_id,
                    topic: delivery.topic,
                    replay_id: delivery.replay_id,
                    payload: delivery.payload,
                };
                if outbound.send(event).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(conn_id = %self.conn_id, %subscription_id, topic, "client subscribed");
        self.subscriptions.insert(
            subscription_id,
            Forwarded {
                subscription,
                forwarder,
            },
        );
    }

    async fn unsubscribe(&mut self, request_id: u64, id: SubscriptionId) {
        // A client may only drop its own subscriptions.
        let Some(forwarded) = self.subscriptions.remove(&id) else {
            return self.reject(request_id, &ChannelError::UnknownSubscription(id));
        };

        match self.bus.unsubscribe(&forwarded.subscription).await {
            Ok(()) => {
                forwarded.forwarder.abort();
                tracing::debug!(
                    conn_id = %self.conn_id,
                    subscription_id = %id,
                    "client unsubscribed"
                );
                self.reply(ServerFrame::Unsubscribed { request_id });
            }
            Err(e) => {
                forwarded.forwarder.abort();
                self.reject(request_id, &e);
            }
        }
    }

    fn reply(&self, frame: ServerFrame) {
        // The writer is gone only once the socket is; nothing left to tell.
        let _ = self.outbound.send(frame);
    }

    fn reject(&self, request_id: u64, error: &ChannelError) {
        tracing::debug!(conn_id = %self.conn_id, request_id, error = %error, "request failed");
        self.reply(ServerFrame::Error {
            request_id: Some(request_id),
            code: error_code(error),
            message: error.to_string(),
        });
    }

    /// Drops every subscription still held for the client.
    async fn close(&mut self) {
        for (id, forwarded) in self.subscriptions.drain() {
            forwarded.forwarder.abort();
            if let Err(e) = self.bus.unsubscribe(&forwarded.subscription).await {
                tracing::debug!(
                    conn_id = %self.conn_id,
                    subscription_id = %id,
                    error = %e,
                    "unsubscribe on close failed"
                );
            }
        }
    }
}

/// Maps a channel error onto an HTTP-style status code.
fn error_code(error: &ChannelError) -> u16 {
    match error {
        ChannelError::UnknownSubscription(_) => 404,
        ChannelError::Unavailable => 503,
        ChannelError::Protocol(_) => 400,
        _ => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            error_code(&ChannelError::UnknownSubscription(SubscriptionId(4))),
            404
        );
        assert_eq!(error_code(&ChannelError::Unavailable), 503);
        assert_eq!(
            error_code(&ChannelError::ConnectionClosed("gone".into())),
            500
        );
    }
}
