//! The drawing board: capture, flush, and replay on one canvas.
//!
//! `DrawingBoard` is plain synchronous state. It knows nothing about
//! channels or tasks; the board actor owns one and feeds it pointer
//! input, flush requests, and remote payloads.

use doodlecast_canvas::{Canvas, PenStyle};
use doodlecast_protocol::{Payload, Point, StrokeEvent, StrokeLog};

use crate::{BoardError, PenState, PointerInput};

/// What a flush does with the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Hand the strokes to peers and persistence.
    Save,
    /// Drop the strokes and wipe every canvas.
    Erase,
}

/// The result of applying a remote payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Erased,
    Replayed {
        /// Events rendered.
        events: usize,
        /// Records that were not recognized and were left out.
        skipped: usize,
    },
}

/// A canvas plus the local pen and the strokes drawn since the last flush.
#[derive(Debug)]
pub struct DrawingBoard<C> {
    canvas: C,
    style: PenStyle,
    pen: PenState,
    log: StrokeLog,
}

impl<C: Canvas> DrawingBoard<C> {
    pub fn new(canvas: C, style: PenStyle) -> Self {
        Self {
            canvas,
            style,
            pen: PenState::Idle,
            log: StrokeLog::new(),
        }
    }

    pub fn pen(&self) -> PenState {
        self.pen
    }

    pub fn log(&self) -> &StrokeLog {
        &self.log
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn style(&self) -> &PenStyle {
        &self.style
    }

    // -----------------------------------------------------------------------
    // Capture
    // -----------------------------------------------------------------------

    /// Feeds one pointer action through the pen.
    ///
    /// An accepted action is drawn at once and appended to the log; the
    /// recorded event is returned. Out-of-sequence input returns `None`
    /// and touches nothing, not even the canvas.
    pub fn input(&mut self, input: PointerInput) -> Option<StrokeEvent> {
        let (next, event) = self.pen.on_input(input);
        self.pen = next;

        let event = event?;
        render(&mut self.canvas, &self.style, &event);
        self.log.push(event);
        Some(event)
    }

    pub fn pointer_down(&mut self, at: Point) -> Option<StrokeEvent> {
        self.input(PointerInput::Down(at))
    }

    pub fn pointer_move(&mut self, to: Point) -> Option<StrokeEvent> {
        self.input(PointerInput::Move(to))
    }

    pub fn pointer_up(&mut self) -> Option<StrokeEvent> {
        self.input(PointerInput::Up)
    }

    // -----------------------------------------------------------------------
    // Flush
    // -----------------------------------------------------------------------

    /// Empties the log into a payload.
    ///
    /// `Save` moves the log out and leaves it empty. If a stroke is still
    /// open, the flushed copy is closed with `End` and the pen is lifted;
    /// further moves are ignored until the next `pointer_down`.
    ///
    /// `Erase` discards the log, clears the canvas, and lifts the pen.
    pub fn flush(&mut self, mode: FlushMode) -> Payload {
        match mode {
            FlushMode::Save => {
                let mut flushed = self.log.take();
                if self.pen.is_stroking() {
                    flushed.push(StrokeEvent::End);
                    self.pen = PenState::Idle;
                }
                Payload::Strokes(flushed)
            }
            FlushMode::Erase => {
                self.wipe();
                Payload::Erase
            }
        }
    }

    // -----------------------------------------------------------------------
    // Replay
    // -----------------------------------------------------------------------

    /// Applies a payload received from a peer.
    ///
    /// The whole payload is decoded before anything is drawn; a payload
    /// that fails to decode leaves the board exactly as it was. Replayed
    /// strokes are drawn but never recorded, and the local pen is left
    /// alone unless the payload is the erase sentinel. A replayed `End`
    /// does not lift the local pen, unlike the browser board this
    /// protocol came from; a stroke in progress here stays well formed.
    pub fn apply(&mut self, raw: &str) -> Result<ApplyOutcome, BoardError> {
        let decoded = Payload::decode(raw).map_err(BoardError::Decode)?;

        match decoded.payload {
            Payload::Erase => {
                self.wipe();
                Ok(ApplyOutcome::Erased)
            }
            Payload::Strokes(strokes) => {
                for event in &strokes {
                    render(&mut self.canvas, &self.style, event);
                }
                Ok(ApplyOutcome::Replayed {
                    events: strokes.len(),
                    skipped: decoded.skipped,
                })
            }
        }
    }

    /// PNG of the current canvas, base64-encoded.
    pub fn snapshot_base64(&self) -> Result<String, BoardError> {
        Ok(self.canvas.snapshot_base64()?)
    }

    fn wipe(&mut self) {
        self.log.clear();
        self.canvas.clear();
        self.pen = PenState::Idle;
    }
}

/// Draws one stroke event. Capture and replay both go through here, so a
/// replayed stroke lands on the same pixels as the original.
fn render<C: Canvas>(canvas: &mut C, style: &PenStyle, event: &StrokeEvent) {
    match *event {
        StrokeEvent::Start { at } => canvas.fill_dot(at, style),
        StrokeEvent::Segment { from, to } => canvas.stroke_line(from, to, style),
        StrokeEvent::End => {}
    }
}
