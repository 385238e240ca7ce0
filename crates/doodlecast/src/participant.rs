//! One person at the board: drawing, chat, and presence on one channel.

use std::sync::Arc;

use doodlecast_board::{
    BoardConfig, BoardHandle, MemorySnapshotStore, NoticeSink, SnapshotStore,
    TracingNotices, spawn_board,
};
use doodlecast_canvas::RasterCanvas;
use doodlecast_channel::Channel;

use crate::presence::{PresenceGuard, PresenceTracker, announce};
use crate::{ChatFeed, DoodlecastError};

/// A joined participant.
///
/// Dropping a participant without calling [`leave`](Self::leave) still
/// announces the departure and drops every subscription, on background
/// tasks. `leave` does the same and waits for it.
pub struct Participant<H: Channel> {
    name: String,
    board: BoardHandle<RasterCanvas>,
    chat: ChatFeed<H>,
    presence: PresenceTracker<H>,
    guard: PresenceGuard<H>,
}

impl<H: Channel> Participant<H> {
    /// Joins with the default board, an in-memory snapshot store, and
    /// notices written to the log.
    pub async fn join(
        name: impl Into<String>,
        channel: Arc<H>,
    ) -> Result<Self, DoodlecastError> {
        Self::join_with(
            name,
            channel,
            BoardConfig::default(),
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(TracingNotices),
        )
        .await
    }

    /// Joins with an explicit board configuration, store, and notice sink.
    pub async fn join_with<S: SnapshotStore>(
        name: impl Into<String>,
        channel: Arc<H>,
        config: BoardConfig,
        store: Arc<S>,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<Self, DoodlecastError> {
        let name = name.into();
        let canvas = RasterCanvas::new(config.width, config.height);

        let board =
            spawn_board(canvas, config, Arc::clone(&channel), store, notices).await?;
        let chat = ChatFeed::join(Arc::clone(&channel), name.clone()).await?;
        let presence = PresenceTracker::join(Arc::clone(&channel)).await?;
        let guard = announce(channel, name.clone()).await?;

        tracing::info!(%name, "participant joined");
        Ok(Self {
            name,
            board,
            chat,
            presence,
            guard,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn board(&self) -> &BoardHandle<RasterCanvas> {
        &self.board
    }

    pub fn chat(&self) -> &ChatFeed<H> {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatFeed<H> {
        &mut self.chat
    }

    pub fn presence(&self) -> &PresenceTracker<H> {
        &self.presence
    }

    pub fn presence_mut(&mut self) -> &mut PresenceTracker<H> {
        &mut self.presence
    }

    /// Stops the board, leaves chat, and announces the departure.
    pub async fn leave(self) -> Result<(), DoodlecastError> {
        let Self {
            name,
            board,
            chat,
            presence,
            guard,
        } = self;

        board.shutdown().await?;
        chat.leave().await?;
        presence.leave().await?;
        guard.leave().await?;

        tracing::info!(%name, "participant left");
        Ok(())
    }
}
