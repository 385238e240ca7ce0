//! Canvas abstraction for Doodlecast.
//!
//! Provides the [`Canvas`] trait that both the capture path and the
//! replay path draw through, so a stroke replayed from a payload lands on
//! exactly the same pixels as the stroke the sender drew.
//!
//! # Implementations
//!
//! - [`RasterCanvas`]: an RGBA pixel buffer with PNG snapshots.
//! - [`RecordingCanvas`]: a raster that also records every draw call.

mod error;
mod raster;
mod recording;

pub use error::CanvasError;
pub use raster::RasterCanvas;
pub use recording::{DrawCall, RecordingCanvas};

use base64::Engine;
use doodlecast_protocol::Point;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
}

/// How strokes look: color, line width, and the size of a pen-down dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub color: Rgba,
    /// Width of a line segment in pixels.
    pub line_width: f64,
    /// Side of the square mark left by a pen-down. Never below one pixel,
    /// so a tap always leaves something visible.
    pub dot_size: f64,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            line_width: 2.0,
            dot_size: 2.0,
        }
    }
}

/// A surface strokes are rendered onto.
///
/// Implementations must be deterministic: the same calls with the same
/// coordinates must produce the same pixels.
pub trait Canvas: Send + 'static {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Marks a pen-down at `at`.
    fn fill_dot(&mut self, at: Point, pen: &PenStyle);

    /// Draws a straight line. A zero-length line still leaves a mark.
    fn stroke_line(&mut self, from: Point, to: Point, pen: &PenStyle);

    /// Erases everything.
    fn clear(&mut self);

    /// Encodes the current pixels as a PNG image.
    ///
    /// # Errors
    /// Returns `CanvasError::Encode` if the encoder fails.
    fn encode_png(&self) -> Result<Vec<u8>, CanvasError>;

    /// The PNG snapshot as standard base64, the form the persistence
    /// collaborator accepts.
    ///
    /// # Errors
    /// Returns `CanvasError::Encode` if the encoder fails.
    fn snapshot_base64(&self) -> Result<String, CanvasError> {
        let png = self.encode_png()?;
        Ok(base64::engine::general_purpose::STANDARD.encode(png))
    }
}
