//! # Doodlecast
//!
//! Shared real-time drawing board for draw-and-guess games.
//!
//! One participant draws; everyone else watches the drawing appear and
//! types guesses into the chat. A drawing travels as a stroke log: the
//! drawer's board records pointer input as `Start`/`Move`/`End` events,
//! and on save publishes the whole log on the `drawing` topic. Peers
//! replay it through the same renderer, so their canvases match pixel
//! for pixel. Publishing `"erase"` clears every board.
//!
//! Peers meet on a [`Channel`](doodlecast_channel::Channel): either the
//! in-process [`EventBus`](doodlecast_channel::EventBus), or a
//! [`WebSocketChannel`](doodlecast_channel::WebSocketChannel) connected
//! to a [`RelayServer`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use doodlecast::prelude::*;
//!
//! # async fn run() -> Result<(), DoodlecastError> {
//! let bus = Arc::new(EventBus::default());
//! let drawer = Participant::join("mina", Arc::clone(&bus)).await?;
//! let _guesser = Participant::join("joon", Arc::clone(&bus)).await?;
//!
//! let board = drawer.board();
//! board.pointer_down(Point::new(10.0, 10.0)).await?;
//! board.pointer_move(Point::new(60.0, 40.0)).await?;
//! board.pointer_up().await?;
//! board.save().await?;
//!
//! drawer.chat().send("guess!").await?;
//! # Ok(())
//! # }
//! ```

mod chat;
mod cleanup;
mod error;
mod handler;
mod participant;
mod presence;
mod server;
mod telemetry;

pub use chat::{CHAT_TOPIC, ChatEntry, ChatError, ChatFeed};
pub use error::DoodlecastError;
pub use participant::Participant;
pub use presence::{PRESENCE_TOPIC, PresenceGuard, PresenceTracker, announce};
pub use server::{RelayServer, RelayServerBuilder};
pub use telemetry::init_tracing;

/// Everything needed to run a board, a chat, or a relay.
pub mod prelude {
    pub use crate::{
        CHAT_TOPIC, ChatEntry, ChatError, ChatFeed, DoodlecastError,
        PRESENCE_TOPIC, Participant, PresenceGuard, PresenceTracker,
        RelayServer, RelayServerBuilder, announce, init_tracing,
    };

    pub use doodlecast_board::{
        BoardConfig, BoardHandle, BoardInfo, DrawingBoard, FlushMode,
        FlushReceipt, InputAdapter, MemorySnapshotStore, Notice,
        NoticeLevel, NoticeQueue, NoticeSink, PenState, PointerInput,
        RawInput, SnapshotStore, TracingNotices, spawn_board,
    };
    pub use doodlecast_canvas::{
        Canvas, PenStyle, RasterCanvas, RecordingCanvas, Rgba,
    };
    pub use doodlecast_channel::{
        BusConfig, Channel, ChannelError, Delivery, EventBus,
        MessageCallback, Subscription, WebSocketChannel,
    };
    pub use doodlecast_protocol::{
        ChatMessage, Payload, Point, PresenceEvent, ReplayFrom, StrokeEvent,
        StrokeLog,
    };
}
