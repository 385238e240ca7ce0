//! Board configuration and the pen state machine.

use doodlecast_canvas::PenStyle;
use doodlecast_protocol::{Point, StrokeEvent};

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

/// Configuration for a drawing board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// How local strokes and replayed strokes are drawn.
    pub pen: PenStyle,

    /// Topic drawing payloads are published and received on.
    pub topic: String,

    /// Command queue size for the board actor.
    pub channel_size: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            pen: PenStyle::default(),
            topic: "drawing".to_string(),
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// PointerInput
// ---------------------------------------------------------------------------

/// The three pointer actions the board understands, in canvas-local
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down(Point),
    Move(Point),
    Up,
}

// ---------------------------------------------------------------------------
// PenState
// ---------------------------------------------------------------------------

/// Whether the local pen is touching the canvas.
///
/// ```text
/// Idle ──Down(p)──▶ Stroking { last: p } ──Move(q)──▶ Stroking { last: q }
///   ▲                        │
///   └──────────Up────────────┘
/// ```
///
/// Anything else (a move or up while idle, a second down while stroking,
/// a non-finite point) leaves the state unchanged and produces no event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PenState {
    #[default]
    Idle,
    Stroking {
        last: Point,
    },
}

impl PenState {
    pub fn is_stroking(&self) -> bool {
        matches!(self, Self::Stroking { .. })
    }

    /// The pure transition function: next state plus the event to record.
    pub fn on_input(self, input: PointerInput) -> (Self, Option<StrokeEvent>) {
        match (self, input) {
            (Self::Idle, PointerInput::Down(at)) if at.is_finite() => {
                (Self::Stroking { last: at }, Some(StrokeEvent::Start { at }))
            }
            (Self::Stroking { last }, PointerInput::Move(to)) if to.is_finite() => (
                Self::Stroking { last: to },
                Some(StrokeEvent::Segment { from: last, to }),
            ),
            (Self::Stroking { .. }, PointerInput::Up) => {
                (Self::Idle, Some(StrokeEvent::End))
            }
            (state, _) => (state, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_from_idle_starts_stroke() {
        let p = Point::new(10.0, 10.0);
        let (next, event) = PenState::Idle.on_input(PointerInput::Down(p));
        assert_eq!(next, PenState::Stroking { last: p });
        assert_eq!(event, Some(StrokeEvent::Start { at: p }));
    }

    #[test]
    fn test_move_chains_from_last_point() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(4.0, 5.0);
        let (next, event) =
            PenState::Stroking { last: a }.on_input(PointerInput::Move(b));
        assert_eq!(next, PenState::Stroking { last: b });
        assert_eq!(event, Some(StrokeEvent::Segment { from: a, to: b }));
    }

    #[test]
    fn test_up_ends_stroke() {
        let state = PenState::Stroking {
            last: Point::new(0.0, 0.0),
        };
        assert_eq!(
            state.on_input(PointerInput::Up),
            (PenState::Idle, Some(StrokeEvent::End))
        );
    }

    #[test]
    fn test_out_of_sequence_inputs_are_ignored() {
        let p = Point::new(3.0, 3.0);
        assert_eq!(
            PenState::Idle.on_input(PointerInput::Move(p)),
            (PenState::Idle, None)
        );
        assert_eq!(PenState::Idle.on_input(PointerInput::Up), (PenState::Idle, None));

        let stroking = PenState::Stroking { last: p };
        assert_eq!(
            stroking.on_input(PointerInput::Down(Point::new(9.0, 9.0))),
            (stroking, None)
        );
    }

    #[test]
    fn test_non_finite_points_are_ignored() {
        let nan = Point::new(f64::NAN, 1.0);
        assert_eq!(
            PenState::Idle.on_input(PointerInput::Down(nan)),
            (PenState::Idle, None)
        );

        let stroking = PenState::Stroking {
            last: Point::new(1.0, 1.0),
        };
        let (next, event) =
            stroking.on_input(PointerInput::Move(Point::new(f64::INFINITY, 0.0)));
        assert_eq!(next, stroking);
        assert!(event.is_none());
    }

    #[test]
    fn test_board_config_default() {
        let config = BoardConfig::default();
        assert_eq!(config.topic, "drawing");
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.pen, PenStyle::default());
    }
}
