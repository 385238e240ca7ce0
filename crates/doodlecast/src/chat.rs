//! The chat feed that runs beside the board.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use doodlecast_channel::{Channel, ChannelError, MessageCallback, Subscription};
use doodlecast_protocol::{ChatMessage, ProtocolError, ReplayFrom};
use tokio::sync::mpsc;

use crate::cleanup::unsubscribe_in_background;

/// Topic chat messages are published on.
pub const CHAT_TOPIC: &str = "chat";

/// Errors from the chat feed.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Blank messages are not sent.
    #[error("message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// One line in the feed, numbered in arrival order from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: usize,
    pub sender: String,
    pub text: String,
    /// Sender's clock, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A participant's view of the chat topic.
///
/// Joining subscribes for new messages only; there is no backlog.
/// Dropping the feed unsubscribes in the background; [`leave`](Self::leave)
/// waits for it.
pub struct ChatFeed<H: Channel> {
    user: String,
    channel: Arc<H>,
    subscription: Subscription,
    subscribed: bool,
    incoming: mpsc::UnboundedReceiver<ChatMessage>,
    entries: Vec<ChatEntry>,
}

impl<H: Channel> ChatFeed<H> {
    pub async fn join(channel: Arc<H>, user: impl Into<String>) -> Result<Self, ChatError> {
        let user = user.into();
        let (tx, incoming) = mpsc::unbounded_channel();
        let on_message: MessageCallback = Arc::new(move |delivery| {
            match ChatMessage::decode(&delivery.payload) {
                Ok(msg) => {
                    let _ = tx.send(msg);
                }
                Err(e) => tracing::warn!(
                    replay_id = delivery.replay_id,
                    error = %e,
                    "ignoring malformed chat message"
                ),
            }
        });

        let subscription = channel
            .subscribe(CHAT_TOPIC, ReplayFrom::NewOnly, on_message)
            .await?;
        tracing::debug!(%user, subscription = %subscription.id, "joined chat");

        Ok(Self {
            user,
            channel,
            subscription,
            subscribed: true,
            incoming,
            entries: Vec::new(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Publishes `text` under this participant's name.
    ///
    /// Surrounding whitespace is trimmed. Returns the replay id.
    ///
    /// # Errors
    /// `ChatError::EmptyMessage` if nothing is left after trimming.
    pub async fn send(&self, text: &str) -> Result<u64, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let msg = ChatMessage {
            sender: self.user.clone(),
            text: text.to_string(),
            sent_at: now_millis(),
        };
        let replay_id = self.channel.publish(CHAT_TOPIC, msg.encode()?).await?;
        Ok(replay_id)
    }

    /// Waits for the next message and adds it to the feed.
    ///
    /// Returns `None` once the channel has dropped the subscription.
    pub async fn next(&mut self) -> Option<&ChatEntry> {
        let msg = self.incoming.recv().await?;
        Some(self.push(msg))
    }

    /// Adds every message that has already arrived. Returns how many.
    pub fn drain_pending(&mut self) -> usize {
        let mut added = 0;
        while let Ok(msg) = self.incoming.try_recv() {
            self.push(msg);
            added += 1;
        }
        added
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Unsubscribes from the chat topic.
    pub async fn leave(mut self) -> Result<(), ChatError> {
        self.subscribed = false;
        self.channel.unsubscribe(&self.subscription).await?;
        Ok(())
    }

    fn push(&mut self, msg: ChatMessage) -> &ChatEntry {
        let id = self.entries.len() + 1;
        self.entries.push(ChatEntry {
            id,
            sender: msg.sender,
            text: msg.text,
            timestamp: msg.sent_at,
        });
        &self.entries[id - 1]
    }
}

impl<H: Channel> Drop for ChatFeed<H> {
    fn drop(&mut self) {
        if self.subscribed {
            unsubscribe_in_background(Arc::clone(&self.channel), self.subscription.clone());
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
