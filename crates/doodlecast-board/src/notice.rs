//! User-facing notices for outcomes that are reported, never fatal.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A toast-like message for whoever is looking at the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, message)
    }

    fn new(
        level: NoticeLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receives notices.
///
/// Called from spawned tasks, so implementations must not block.
pub trait NoticeSink: Send + Sync + 'static {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!(title = %notice.title, "{}", notice.message);
            }
            NoticeLevel::Error => {
                tracing::warn!(title = %notice.title, "{}", notice.message);
            }
        }
    }
}

/// Forwards notices over a channel, e.g. to a UI task.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    sender: mpsc::UnboundedSender<Notice>,
}

impl NoticeQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NoticeSink for NoticeQueue {
    fn notify(&self, notice: Notice) {
        // Nobody listening any more; the notice has nowhere to go.
        let _ = self.sender.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_constructors_set_level() {
        assert_eq!(Notice::success("t", "m").level, NoticeLevel::Success);
        assert_eq!(Notice::info("t", "m").level, NoticeLevel::Info);
        assert_eq!(Notice::error("t", "m").level, NoticeLevel::Error);
    }

    #[test]
    fn test_notice_queue_forwards() {
        let (queue, mut rx) = NoticeQueue::new();
        queue.notify(Notice::success("Drawing", "Saved successfully."));

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.message, "Saved successfully.");
    }

    #[test]
    fn test_notice_queue_survives_dropped_receiver() {
        let (queue, rx) = NoticeQueue::new();
        drop(rx);
        queue.notify(Notice::error("Drawing", "An error occurred."));
    }
}
