//! Maps raw mouse and touch events to [`PointerInput`].
//!
//! Browser-style events report client coordinates; the board wants
//! canvas-local ones. The adapter subtracts the canvas origin and folds
//! touch events into the same three pointer actions the mouse produces.

use doodlecast_protocol::Point;

use crate::PointerInput;

/// A raw event from the host surface.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    MouseDown { client: Point },
    MouseMove { client: Point },
    MouseUp,
    /// The pointer left the canvas. Ends the stroke like a mouse up.
    MouseLeave,
    /// `touches` lists the active touch points, first one first.
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    TouchEnd,
}

/// An adapted event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adapted {
    pub input: PointerInput,
    /// The host should suppress its default handling (scroll, zoom).
    pub prevent_default: bool,
}

/// Converts [`RawInput`] into [`PointerInput`] relative to a canvas
/// whose top-left corner sits at `origin` in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputAdapter {
    origin: Point,
}

impl InputAdapter {
    pub fn new(origin: Point) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Call when the canvas moves (scroll, layout change).
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Returns `None` for a touch event without any touch point.
    pub fn adapt(&self, raw: &RawInput) -> Option<Adapted> {
        let adapted = match raw {
            RawInput::MouseDown { client } => Adapted {
                input: PointerInput::Down(self.local(*client)),
                prevent_default: false,
            },
            RawInput::MouseMove { client } => Adapted {
                input: PointerInput::Move(self.local(*client)),
                prevent_default: false,
            },
            RawInput::MouseUp | RawInput::MouseLeave => Adapted {
                input: PointerInput::Up,
                prevent_default: false,
            },
            RawInput::TouchStart { touches } => Adapted {
                input: PointerInput::Down(self.local(*touches.first()?)),
                prevent_default: true,
            },
            RawInput::TouchMove { touches } => Adapted {
                input: PointerInput::Move(self.local(*touches.first()?)),
                prevent_default: true,
            },
            RawInput::TouchEnd => Adapted {
                input: PointerInput::Up,
                prevent_default: false,
            },
        };
        Some(adapted)
    }

    fn local(&self, client: Point) -> Point {
        Point::new(client.x - self.origin.x, client.y - self.origin.y)
    }
}
