//! In-process event bus: an isolated Tokio task that owns every topic.
//!
//! The bus is an actor. [`EventBus`] is a cheap handle holding the
//! command sender; the topics, subscriber lists, and retained history
//! live inside the task and are only touched there.

use std::collections::{HashMap, VecDeque};
use std::future::Future;

use doodlecast_protocol::{ReplayFrom, SubscriptionId};
use tokio::sync::{mpsc, oneshot};

use crate::{Channel, ChannelError, Delivery, MessageCallback, Subscription};

/// Settings for an [`EventBus`].
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Events kept per topic for `-2` / replay-id subscribers. 0 keeps none.
    pub retention: usize,

    /// Command queue size. Publishers wait when it fills up.
    pub channel_size: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            retention: 256,
            channel_size: 64,
        }
    }
}

/// A snapshot of bus counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusStats {
    pub topics: usize,
    pub subscriptions: usize,
    /// Replay id of the most recent publish, 0 if nothing was published.
    pub last_replay_id: u64,
}

/// Commands sent to the bus actor. Variants with a `reply` are
/// request/response; the caller awaits the oneshot.
enum BusCommand {
    Subscribe {
        topic: String,
        replay_from: ReplayFrom,
        callback: MessageCallback,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    Publish {
        topic: String,
        payload: String,
        reply: oneshot::Sender<u64>,
    },
    Stats {
        reply: oneshot::Sender<BusStats>,
    },
    Shutdown,
}

/// Handle to a running bus actor.
///
/// Cloning is cheap; every clone talks to the same bus.
#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::Sender<BusCommand>,
}

impl EventBus {
    /// Spawns a bus actor on the current Tokio runtime.
    pub fn new(config: BusConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));

        let actor = BusActor {
            retention: config.retention,
            topics: HashMap::new(),
            subscriptions: HashMap::new(),
            next_subscription: 1,
            last_replay_id: 0,
            receiver: rx,
        };
        tokio::spawn(actor.run());

        Self { sender: tx }
    }

    /// Current counters.
    pub async fn stats(&self) -> Result<BusStats, ChannelError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(BusCommand::Stats { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ChannelError::Unavailable)
    }

    /// Stops the actor. Later calls on any handle fail with
    /// `ChannelError::Unavailable`.
    pub async fn shutdown(&self) -> Result<(), ChannelError> {
        self.send(BusCommand::Shutdown).await
    }

    async fn send(&self, cmd: BusCommand) -> Result<(), ChannelError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| ChannelError::Unavailable)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl Channel for EventBus {
    fn subscribe(
        &self,
        topic: &str,
        replay_from: ReplayFrom,
        on_message: MessageCallback,
    ) -> impl Future<Output = Result<Subscription, ChannelError>> + Send {
        let topic = topic.to_string();
        async move {
            let (reply_tx, reply_rx) = oneshot::channel();
            self.send(BusCommand::Subscribe {
                topic: topic.clone(),
                replay_from,
                callback: on_message,
                reply: reply_tx,
            })
            .await?;
            let id = reply_rx.await.map_err(|_| ChannelError::Unavailable)?;
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
            let (reply_tx, reply_rx) = oneshot::channel();
            self.send(BusCommand::Unsubscribe { id, reply: reply_tx })
                .await?;
            let removed =
                reply_rx.await.map_err(|_| ChannelError::Unavailable)?;
            if removed {
                Ok(())
            } else {
                Err(ChannelError::UnknownSubscription(id))
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
            let (reply_tx, reply_rx) = oneshot::channel();
            self.send(BusCommand::Publish {
                topic,
                payload,
                reply: reply_tx,
            })
            .await?;
            reply_rx.await.map_err(|_| ChannelError::Unavailable)
        }
    }
}

#[derive(Default)]
struct TopicState {
    subscribers: Vec<(SubscriptionId, MessageCallback)>,
    history: VecDeque<Delivery>,
}

/// The internal bus state. Runs inside a Tokio task.
struct BusActor {
    retention: usize,
    topics: HashMap<String, TopicState>,
    /// Subscription → topic, so unsubscribe doesn't scan every topic.
    subscriptions: HashMap<SubscriptionId, String>,
    next_subscription: u64,
    last_replay_id: u64,
    receiver: mpsc::Receiver<BusCommand>,
}

impl BusActor {
    async fn run(mut self) {
        tracing::debug!(retention = self.retention, "event bus started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                BusCommand::Subscribe {
                    topic,
                    replay_from,
                    callback,
                    reply,
                } => {
                    let id = self.handle_subscribe(topic, replay_from, callback);
                    let _ = reply.send(id);
                }
                BusCommand::Unsubscribe { id, reply } => {
                    let _ = reply.send(self.handle_unsubscribe(id));
                }
                BusCommand::Publish {
                    topic,
                    payload,
                    reply,
                } => {
                    let _ = reply.send(self.handle_publish(topic, payload));
                }
                BusCommand::Stats { reply } => {
                    let _ = reply.send(self.stats());
                }
                BusCommand::Shutdown => {
                    tracing::debug!("event bus shutting down");
                    break;
                }
            }
        }

        tracing::debug!("event bus stopped");
    }

    fn handle_subscribe(
        &mut self,
        topic: String,
        replay_from: ReplayFrom,
        callback: MessageCallback,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let state = self.topics.entry(topic.clone()).or_default();

        // Retained events go out before the subscriber can see new ones.
        let mut replayed = 0usize;
        for delivery in &state.history {
            if replay_from.includes(delivery.replay_id) {
                callback(delivery.clone());
                replayed += 1;
            }
        }

        state.subscribers.push((id, callback));
        tracing::debug!(
            %topic,
            subscription = %id,
            %replay_from,
            replayed,
            "subscribed"
        );
        self.subscriptions.insert(id, topic);
        id
    }

    fn handle_unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(topic) = self.subscriptions.remove(&id) else {
            return false;
        };
        if let Some(state) = self.topics.get_mut(&topic) {
            state.subscribers.retain(|(sid, _)| *sid != id);
        }
        tracing::debug!(%topic, subscription = %id, "unsubscribed");
        true
    }

    fn handle_publish(&mut self, topic: String, payload: String) -> u64 {
        self.last_replay_id += 1;
        let delivery = Delivery {
            topic: topic.clone(),
            replay_id: self.last_replay_id,
            payload,
        };

        let state = self.topics.entry(topic).or_default();
        for (_, callback) in &state.subscribers {
            callback(delivery.clone());
        }
        tracing::trace!(
            topic = %delivery.topic,
            replay_id = delivery.replay_id,
            subscribers = state.subscribers.len(),
            "event published"
        );

        if self.retention > 0 {
            state.history.push_back(delivery);
            while state.history.len() > self.retention {
                state.history.pop_front();
            }
        }

        self.last_replay_id
    }

    fn stats(&self) -> BusStats {
        BusStats {
            topics: self.topics.len(),
            subscriptions: self.subscriptions.len(),
            last_replay_id: self.last_replay_id,
        }
    }
}
