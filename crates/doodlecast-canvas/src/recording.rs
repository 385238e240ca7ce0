//! A raster that remembers every call made to it.

use doodlecast_protocol::Point;

use crate::{Canvas, CanvasError, PenStyle, RasterCanvas};

/// One call made through the [`Canvas`] trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    Dot(Point),
    Line(Point, Point),
    Clear,
}

/// A [`RasterCanvas`] that also keeps a list of the calls it received.
///
/// Useful for headless peers and for asserting that an input produced no
/// render call at all.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    raster: RasterCanvas,
    calls: Vec<DrawCall>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RasterCanvas::new(width, height),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Returns the recorded calls and starts a fresh list.
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn raster(&self) -> &RasterCanvas {
        &self.raster
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> u32 {
        self.raster.width()
    }

    fn height(&self) -> u32 {
        self.raster.height()
    }

    fn fill_dot(&mut self, at: Point, pen: &PenStyle) {
        self.calls.push(DrawCall::Dot(at));
        self.raster.fill_dot(at, pen);
    }

    fn stroke_line(&mut self, from: Point, to: Point, pen: &PenStyle) {
        self.calls.push(DrawCall::Line(from, to));
        self.raster.stroke_line(from, to, pen);
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
        self.raster.clear();
    }

    fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.raster.encode_png()
    }
}
