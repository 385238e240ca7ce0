//! Board actor: an isolated Tokio task that owns a drawing board.
//!
//! The actor is the only place the canvas, pen, and log are touched.
//! Local input arrives as commands through an mpsc channel; payloads from
//! peers arrive through a second queue fed by the channel subscription.
//! Publishing and persistence run on spawned tasks so neither ever holds
//! up drawing.

use std::sync::Arc;

use doodlecast_canvas::Canvas;
use doodlecast_channel::{
    Channel, ChannelError, Delivery, MessageCallback, Subscription,
};
use doodlecast_protocol::{Payload, Point, ReplayFrom};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::echo::EchoFilter;
use crate::{
    ApplyOutcome, BoardConfig, BoardError, DrawingBoard, FlushMode, Notice,
    NoticeSink, PenState, PersistError, PointerInput, SnapshotStore,
};

/// What a save or erase handed off.
///
/// The board never waits on the two handles; they are here for callers
/// that want to know how delivery and persistence went.
#[derive(Debug)]
pub struct FlushReceipt {
    pub payload: Payload,
    /// Resolves to the replay id the channel stamped on the payload.
    pub delivery: JoinHandle<Result<u64, ChannelError>>,
    /// Present for saves only.
    pub persistence: Option<JoinHandle<Result<(), PersistError>>>,
}

/// A snapshot of board metadata (not the drawing itself).
#[derive(Debug, Clone, PartialEq)]
pub struct BoardInfo {
    pub topic: String,
    pub subscription: Subscription,
    pub pen: PenState,
    /// Events waiting in the local log for the next flush.
    pub pending_events: usize,
}

type Inspector<C> = Box<dyn FnOnce(&DrawingBoard<C>) + Send>;

/// Commands sent to a board actor through its channel.
pub(crate) enum BoardCommand<C> {
    /// A pointer action (fire-and-forget).
    Input(PointerInput),

    Flush {
        mode: FlushMode,
        reply: oneshot::Sender<FlushReceipt>,
    },

    GetInfo {
        reply: oneshot::Sender<BoardInfo>,
    },

    /// Runs a closure against the board, on the actor's task.
    Inspect(Inspector<C>),

    /// The channel stamped one of our publishes.
    Published { payload: String, replay_id: u64 },

    /// A publish of ours failed, so its echo will never come back.
    PublishFailed { payload: String },

    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running board actor.
///
/// Cheap to clone; it is just an `mpsc::Sender` wrapper.
pub struct BoardHandle<C> {
    sender: mpsc::Sender<BoardCommand<C>>,
}

impl<C> Clone for BoardHandle<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<C: Canvas> BoardHandle<C> {
    /// Sends a pointer action to the board.
    pub async fn input(&self, input: PointerInput) -> Result<(), BoardError> {
        self.send(BoardCommand::Input(input)).await
    }

    pub async fn pointer_down(&self, at: Point) -> Result<(), BoardError> {
        self.input(PointerInput::Down(at)).await
    }

    pub async fn pointer_move(&self, to: Point) -> Result<(), BoardError> {
        self.input(PointerInput::Move(to)).await
    }

    pub async fn pointer_up(&self) -> Result<(), BoardError> {
        self.input(PointerInput::Up).await
    }

    /// Flushes the strokes to peers and hands a snapshot to the store.
    pub async fn save(&self) -> Result<FlushReceipt, BoardError> {
        self.flush(FlushMode::Save).await
    }

    /// Wipes this canvas and tells peers to wipe theirs.
    pub async fn erase(&self) -> Result<FlushReceipt, BoardError> {
        self.flush(FlushMode::Erase).await
    }

    pub async fn info(&self) -> Result<BoardInfo, BoardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(BoardCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| BoardError::Unavailable)
    }

    /// Runs `f` against the board and returns its result.
    ///
    /// Commands sent before this call have been handled by the time `f`
    /// runs. Remote payloads may still be queued.
    pub async fn inspect<R, F>(&self, f: F) -> Result<R, BoardError>
    where
        R: Send + 'static,
        F: FnOnce(&DrawingBoard<C>) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let inspector: Inspector<C> = Box::new(move |board| {
            let _ = reply_tx.send(f(board));
        });
        self.send(BoardCommand::Inspect(inspector)).await?;
        reply_rx.await.map_err(|_| BoardError::Unavailable)
    }

    /// PNG of the current canvas, base64-encoded.
    pub async fn snapshot_base64(&self) -> Result<String, BoardError> {
        self.inspect(|board| board.snapshot_base64()).await?
    }

    /// Stops the actor and waits until it has unsubscribed.
    pub async fn shutdown(&self) -> Result<(), BoardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(BoardCommand::Shutdown { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| BoardError::Unavailable)
    }

    async fn flush(&self, mode: FlushMode) -> Result<FlushReceipt, BoardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(BoardCommand::Flush {
            mode,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| BoardError::Unavailable)
    }

    async fn send(&self, cmd: BoardCommand<C>) -> Result<(), BoardError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| BoardError::Unavailable)
    }
}

/// The internal board actor state. Runs inside a Tokio task.
struct BoardActor<C, H, S> {
    board: DrawingBoard<C>,
    topic: String,
    subscription: Subscription,
    channel: Arc<H>,
    store: Arc<S>,
    notices: Arc<dyn NoticeSink>,
    echoes: EchoFilter,
    /// Used by publish tasks to report outcomes; weak so it doesn't keep
    /// the actor alive.
    commands: mpsc::WeakSender<BoardCommand<C>>,
    receiver: mpsc::Receiver<BoardCommand<C>>,
    remote: mpsc::UnboundedReceiver<Delivery>,
}

impl<C, H, S> BoardActor<C, H, S>
where
    C: Canvas,
    H: Channel,
    S: SnapshotStore,
{
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!(
            topic = %self.topic,
            subscription = %self.subscription.id,
            "board actor started"
        );

        let mut shutdown_reply = None;
        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(BoardCommand::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(delivery) = self.remote.recv() => {
                    // Let the current burst of local work finish first.
                    tokio::task::yield_now().await;
                    self.handle_remote(delivery);
                }
            }
        }

        if let Err(e) = self.channel.unsubscribe(&self.subscription).await {
            tracing::warn!(topic = %self.topic, error = %e, "unsubscribe failed");
        }
        tracing::info!(topic = %self.topic, "board actor stopped");

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn handle_command(&mut self, cmd: BoardCommand<C>) {
        match cmd {
            BoardCommand::Input(input) => {
                self.board.input(input);
            }
            BoardCommand::Flush { mode, reply } => {
                let receipt = self.handle_flush(mode);
                let _ = reply.send(receipt);
            }
            BoardCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            BoardCommand::Inspect(inspector) => inspector(&self.board),
            BoardCommand::Published { payload, replay_id } => {
                self.echoes.stamped(&payload, replay_id);
            }
            BoardCommand::PublishFailed { payload } => {
                self.echoes.failed(&payload);
            }
            BoardCommand::Shutdown { .. } => {}
        }
    }

    fn handle_flush(&mut self, mode: FlushMode) -> FlushReceipt {
        // Snapshot before the flush; erase would wipe the pixels.
        let persistence = match mode {
            FlushMode::Save => Some(self.persist()),
            FlushMode::Erase => None,
        };
        let payload = self.board.flush(mode);
        tracing::debug!(topic = %self.topic, ?mode, "board flushed");

        let delivery = self.publish(&payload);
        FlushReceipt {
            payload,
            delivery,
            persistence,
        }
    }

    fn handle_remote(&mut self, delivery: Delivery) {
        if self.echoes.is_echo(delivery.replay_id, &delivery.payload) {
            tracing::trace!(replay_id = delivery.replay_id, "skipping own echo");
            return;
        }

        match self.board.apply(&delivery.payload) {
            Ok(ApplyOutcome::Erased) => {
                tracing::debug!(replay_id = delivery.replay_id, "remote erase applied");
            }
            Ok(ApplyOutcome::Replayed { events, skipped }) => {
                if skipped > 0 {
                    tracing::warn!(
                        replay_id = delivery.replay_id,
                        skipped,
                        "remote payload had unrecognized records"
                    );
                }
                tracing::debug!(
                    replay_id = delivery.replay_id,
                    events,
                    "remote strokes replayed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    replay_id = delivery.replay_id,
                    error = %e,
                    "dropping undecodable payload"
                );
            }
        }
    }

    /// Publishes on a spawned task. Failures become notices.
    fn publish(&mut self, payload: &Payload) -> JoinHandle<Result<u64, ChannelError>> {
        let encoded = payload.encode();
        if let Ok(raw) = &encoded {
            self.echoes.sent(raw);
        }

        let channel = Arc::clone(&self.channel);
        let notices = Arc::clone(&self.notices);
        let commands = self.commands.clone();
        let topic = self.topic.clone();

        tokio::spawn(async move {
            let raw = encoded?;
            match channel.publish(&topic, raw.clone()).await {
                Ok(replay_id) => {
                    tracing::debug!(%topic, replay_id, "drawing published");
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands
                            .send(BoardCommand::Published { payload: raw, replay_id })
                            .await;
                    }
                    Ok(replay_id)
                }
                Err(e) => {
                    tracing::warn!(%topic, error = %e, "drawing publish failed");
                    notices.notify(Notice::error("Error sending drawing", e.to_string()));
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands
                            .send(BoardCommand::PublishFailed { payload: raw })
                            .await;
                    }
                    Err(e)
                }
            }
        })
    }

    /// Hands a snapshot to the store on a spawned task and reports the
    /// outcome as a notice.
    fn persist(&self) -> JoinHandle<Result<(), PersistError>> {
        let snapshot = self.board.snapshot_base64();
        let store = Arc::clone(&self.store);
        let notices = Arc::clone(&self.notices);

        tokio::spawn(async move {
            let result = match snapshot {
                Ok(png) => store.save_snapshot(png).await,
                Err(e) => Err(PersistError::Rejected(e.to_string())),
            };
            match &result {
                Ok(()) => notices.notify(Notice::success("", "Saved successfully.")),
                Err(e) => {
                    tracing::warn!(error = %e, "snapshot not saved");
                    notices.notify(Notice::error("", "An error occurred."));
                }
            }
            result
        })
    }

    fn info(&self) -> BoardInfo {
        BoardInfo {
            topic: self.topic.clone(),
            subscription: self.subscription.clone(),
            pen: self.board.pen(),
            pending_events: self.board.log().len(),
        }
    }
}

/// Subscribes a board to `config.topic` and spawns its actor.
///
/// The subscription starts at [`ReplayFrom::NewOnly`]: a board that joins
/// late stays blank until the next flush from a peer.
///
/// # Errors
/// Returns `BoardError::Channel` if the subscription fails. The failure
/// is also reported to `notices`.
pub async fn spawn_board<C, H, S>(
    canvas: C,
    config: BoardConfig,
    channel: Arc<H>,
    store: Arc<S>,
    notices: Arc<dyn NoticeSink>,
) -> Result<BoardHandle<C>, BoardError>
where
    C: Canvas,
    H: Channel,
    S: SnapshotStore,
{
    let (remote_tx, remote_rx) = mpsc::unbounded_channel();
    // After teardown the receiver is gone and late deliveries are dropped.
    let on_message: MessageCallback = Arc::new(move |delivery| {
        let _ = remote_tx.send(delivery);
    });

    let subscription = match channel
        .subscribe(&config.topic, ReplayFrom::NewOnly, on_message)
        .await
    {
        Ok(subscription) => subscription,
        Err(e) => {
            notices.notify(Notice::error("Error subscribing to channel", e.to_string()));
            return Err(e.into());
        }
    };

    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = BoardActor {
        board: DrawingBoard::new(canvas, config.pen),
        topic: config.topic,
        subscription,
        channel,
        store,
        notices,
        echoes: EchoFilter::default(),
        commands: tx.downgrade(),
        receiver: rx,
        remote: remote_rx,
    };

    tokio::spawn(actor.run());

    Ok(BoardHandle { sender: tx })
}
