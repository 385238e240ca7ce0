//! Stroke capture, flush, and replay for a shared drawing board.
//!
//! Each board runs as an isolated Tokio task (actor model) that owns its
//! canvas, pen, and stroke log. Local pointer input is drawn at once and
//! recorded; a save or erase flushes the record to peers over a
//! [`Channel`](doodlecast_channel::Channel); payloads from peers are
//! replayed onto the same canvas.
//!
//! # Key types
//!
//! - [`DrawingBoard`]: synchronous capture/flush/replay state
//! - [`PenState`]: the pen's two-state machine
//! - [`InputAdapter`]: mouse and touch events to [`PointerInput`]
//! - [`BoardHandle`]: send commands to a running board actor
//! - [`SnapshotStore`]: where saved drawings go
//! - [`NoticeSink`]: where success and failure reports go

mod actor;
mod board;
mod config;
mod echo;
mod error;
mod input;
mod notice;
mod persist;

pub use actor::{BoardHandle, BoardInfo, FlushReceipt, spawn_board};
pub use board::{ApplyOutcome, DrawingBoard, FlushMode};
pub use config::{BoardConfig, PenState, PointerInput};
pub use error::{BoardError, PersistError};
pub use input::{Adapted, InputAdapter, RawInput};
pub use notice::{Notice, NoticeLevel, NoticeQueue, NoticeSink, TracingNotices};
pub use persist::{MemorySnapshotStore, SnapshotStore};
