//! Who is at the board right now.
//!
//! Participants announce themselves on the presence topic and hold a
//! [`PresenceGuard`]; dropping the guard announces the departure. A
//! [`PresenceTracker`] folds the announcements into the set of users
//! online.

use std::collections::BTreeSet;
use std::sync::Arc;

use doodlecast_channel::{Channel, ChannelError, MessageCallback, Subscription};
use doodlecast_protocol::{PresenceEvent, ReplayFrom};
use tokio::sync::mpsc;

use crate::cleanup::unsubscribe_in_background;

/// Topic presence events are published on.
pub const PRESENCE_TOPIC: &str = "presence";

/// Tracks the users currently online.
///
/// Subscribes with [`ReplayFrom::AllRetained`] so a late joiner rebuilds
/// the set from whatever history the channel still holds. Dropping the
/// tracker unsubscribes in the background.
pub struct PresenceTracker<H: Channel> {
    channel: Arc<H>,
    subscription: Subscription,
    subscribed: bool,
    incoming: mpsc::UnboundedReceiver<PresenceEvent>,
    online: BTreeSet<String>,
}

impl<H: Channel> PresenceTracker<H> {
    pub async fn join(channel: Arc<H>) -> Result<Self, ChannelError> {
        let (tx, incoming) = mpsc::unbounded_channel();
        let on_message: MessageCallback = Arc::new(move |delivery| {
            match PresenceEvent::decode(&delivery.payload) {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => tracing::warn!(
                    replay_id = delivery.replay_id,
                    error = %e,
                    "ignoring malformed presence event"
                ),
            }
        });

        let subscription = channel
            .subscribe(PRESENCE_TOPIC, ReplayFrom::AllRetained, on_message)
            .await?;

        Ok(Self {
            channel,
            subscription,
            subscribed: true,
            incoming,
            online: BTreeSet::new(),
        })
    }

    /// Waits for the next presence event and applies it.
    pub async fn next(&mut self) -> Option<PresenceEvent> {
        let event = self.incoming.recv().await?;
        self.apply(&event);
        Some(event)
    }

    /// Applies every event that has already arrived. Returns how many.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.incoming.try_recv() {
            self.apply(&event);
            applied += 1;
        }
        applied
    }

    pub fn is_online(&self, user: &str) -> bool {
        self.online.contains(user)
    }

    /// Online users in name order.
    pub fn online(&self) -> impl Iterator<Item = &str> {
        self.online.iter().map(String::as_str)
    }

    pub async fn leave(mut self) -> Result<(), ChannelError> {
        self.subscribed = false;
        self.channel.unsubscribe(&self.subscription).await
    }

    fn apply(&mut self, event: &PresenceEvent) {
        match event {
            PresenceEvent::Connected { user } => {
                self.online.insert(user.clone());
            }
            PresenceEvent::Disconnected { user } => {
                self.online.remove(user);
            }
        }
    }
}

impl<H: Channel> Drop for PresenceTracker<H> {
    fn drop(&mut self) {
        if self.subscribed {
            unsubscribe_in_background(Arc::clone(&self.channel), self.subscription.clone());
        }
    }
}

/// Publishes `Connected` for `user` and returns a guard that publishes
/// `Disconnected` when it goes away.
pub async fn announce<H: Channel>(
    channel: Arc<H>,
    user: impl Into<String>,
) -> Result<PresenceGuard<H>, ChannelError> {
    let user = user.into();
    let event = PresenceEvent::Connected { user: user.clone() };
    channel.publish(PRESENCE_TOPIC, event.encode()?).await?;
    tracing::info!(%user, "user connected");

    Ok(PresenceGuard {
        user,
        channel,
        announced: true,
    })
}

/// Drop guard that announces a user's departure.
///
/// Since `Drop` is synchronous, the announcement is published from a
/// spawned task. Use [`leave`](Self::leave) to await it instead.
pub struct PresenceGuard<H: Channel> {
    user: String,
    channel: Arc<H>,
    announced: bool,
}

impl<H: Channel> PresenceGuard<H> {
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Publishes `Disconnected` and waits for the channel to accept it.
    pub async fn leave(mut self) -> Result<(), ChannelError> {
        self.announced = false;
        publish_departure(Arc::clone(&self.channel), self.user.clone()).await
    }
}

impl<H: Channel> Drop for PresenceGuard<H> {
    fn drop(&mut self) {
        if !self.announced {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(user = %self.user, "no runtime, departure not announced");
            return;
        };
        let channel = Arc::clone(&self.channel);
        let user = self.user.clone();
        runtime.spawn(async move {
            if let Err(e) = publish_departure(channel, user).await {
                tracing::debug!(error = %e, "departure not announced");
            }
        });
    }
}

async fn publish_departure<H: Channel>(
    channel: Arc<H>,
    user: String,
) -> Result<(), ChannelError> {
    let event = PresenceEvent::Disconnected { user: user.clone() };
    channel.publish(PRESENCE_TOPIC, event.encode()?).await?;
    tracing::info!(%user, "user disconnected");
    Ok(())
}
