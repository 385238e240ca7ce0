//! In-memory RGBA raster.

use doodlecast_protocol::Point;

use crate::{Canvas, CanvasError, PenStyle, Rgba};

/// A fixed-size RGBA pixel buffer, transparent when cleared.
///
/// Dots are axis-aligned squares whose top-left corner is the pen-down
/// point. Lines are stamped with a square brush centered on evenly
/// spaced samples between the endpoints, after clipping the segment to
/// the canvas (grown by the brush size) so wild coordinates can't make
/// the stamping loop run long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterCanvas {
    /// Creates a blank canvas. Zero dimensions are raised to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The color at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[i..i + 4]);
        Some(Rgba(rgba))
    }

    /// Number of pixels that are not fully transparent.
    pub fn painted_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.painted_count() == 0
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let i = self.index(x as u32, y as u32);
        self.pixels[i..i + 4].copy_from_slice(&color.0);
    }

    fn fill_square(&mut self, left: f64, top: f64, size: f64, color: Rgba) {
        let size = size.max(1.0).round().min(f64::from(u32::MAX)) as i64;
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        // Corners far off the canvas would overflow `x0 + size`.
        let x0 = (left.floor() as i64).clamp(-size, width);
        let y0 = (top.floor() as i64).clamp(-size, height);
        for y in y0.max(0)..(y0 + size).min(height) {
            for x in x0.max(0)..(x0 + size).min(width) {
                self.put(x, y, color);
            }
        }
    }
}

impl Canvas for RasterCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_dot(&mut self, at: Point, pen: &PenStyle) {
        if !at.is_finite() {
            return;
        }
        self.fill_square(at.x, at.y, pen.dot_size, pen.color);
    }

    fn stroke_line(&mut self, from: Point, to: Point, pen: &PenStyle) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let brush = pen.line_width.max(1.0);
        let half = brush / 2.0;

        let Some((a, b)) = clip_segment(
            from,
            to,
            -brush,
            -brush,
            f64::from(self.width) + brush,
            f64::from(self.height) + brush,
        ) else {
            return;
        };

        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u64;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = a.x + dx * t;
            let y = a.y + dy * t;
            self.fill_square(x - half, y - half, brush, pen.color);
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        tracing::trace!(bytes = out.len(), "canvas encoded as png");
        Ok(out)
    }
}

/// Liang–Barsky clip of the segment `from → to` against a rectangle.
/// Returns `None` when the segment misses it entirely.
fn clip_segment(
    from: Point,
    to: Point,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
) -> Option<(Point, Point)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, from.x - min_x),
        (dx, max_x - from.x),
        (-dy, from.y - min_y),
        (dy, max_y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        Point::new(from.x + dx * t0, from.y + dy * t0),
        Point::new(from.x + dx * t1, from.y + dy * t1),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> PenStyle {
        PenStyle::default()
    }

    #[test]
    fn test_new_canvas_is_blank() {
        let canvas = RasterCanvas::new(8, 6);
        assert!(canvas.is_blank());
        assert_eq!(canvas.pixels().len(), 8 * 6 * 4);
    }

    #[test]
    fn test_zero_dimensions_raised_to_one() {
        let canvas = RasterCanvas::new(0, 0);
        assert_eq!((canvas.width(), canvas.height()), (1, 1));
    }

    #[test]
    fn test_dot_fills_square_from_top_left() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_dot(Point::new(3.0, 4.0), &pen());

        assert_eq!(canvas.painted_count(), 4);
        assert_eq!(canvas.pixel(3, 4), Some(Rgba::BLACK));
        assert_eq!(canvas.pixel(4, 5), Some(Rgba::BLACK));
        assert_eq!(canvas.pixel(5, 5), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_tiny_dot_still_visible() {
        let mut canvas = RasterCanvas::new(10, 10);
        let pen = PenStyle {
            dot_size: 0.1,
            ..PenStyle::default()
        };
        canvas.fill_dot(Point::new(1.0, 1.0), &pen);
        assert_eq!(canvas.painted_count(), 1);
    }

    #[test]
    fn test_zero_length_line_leaves_mark() {
        let mut canvas = RasterCanvas::new(10, 10);
        let p = Point::new(5.0, 5.0);
        canvas.stroke_line(p, p, &pen());
        assert!(!canvas.is_blank());
    }

    #[test]
    fn test_horizontal_line_covers_span() {
        let mut canvas = RasterCanvas::new(20, 10);
        canvas.stroke_line(Point::new(2.0, 5.0), Point::new(12.0, 5.0), &pen());
        for x in 2..12 {
            assert_eq!(canvas.pixel(x, 5), Some(Rgba::BLACK), "x = {x}");
        }
        assert_eq!(canvas.pixel(15, 5), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_line_outside_canvas_draws_nothing() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.stroke_line(Point::new(50.0, 50.0), Point::new(90.0, 90.0), &pen());
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_huge_line_is_clipped() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.stroke_line(Point::new(-1e12, 5.0), Point::new(1e12, 5.0), &pen());
        assert_eq!(canvas.pixel(0, 5), Some(Rgba::BLACK));
        assert_eq!(canvas.pixel(9, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn test_far_off_dot_draws_nothing() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_dot(Point::new(1e300, 5.0), &pen());
        canvas.fill_dot(Point::new(-1e300, -1e300), &pen());
        canvas.fill_dot(Point::new(5.0, f64::MAX), &pen());
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_dot_across_corner_is_cropped() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_dot(Point::new(-1.0, -1.0), &pen());
        assert_eq!(canvas.painted_count(), 1);
        assert_eq!(canvas.pixel(0, 0), Some(Rgba::BLACK));
    }

    #[test]
    fn test_non_finite_points_ignored() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_dot(Point::new(f64::NAN, 1.0), &pen());
        canvas.stroke_line(Point::new(1.0, 1.0), Point::new(f64::INFINITY, 1.0), &pen());
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_clear_wipes_pixels() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_dot(Point::new(1.0, 1.0), &pen());
        canvas.clear();
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_png_has_signature() {
        let canvas = RasterCanvas::new(4, 4);
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_snapshot_base64_is_png() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.fill_dot(Point::new(0.0, 0.0), &pen());
        let b64 = canvas.snapshot_base64().unwrap();
        // base64 of the PNG signature.
        assert!(b64.starts_with("iVBORw0KGgo"));
    }

    #[test]
    fn test_clip_segment_inside_is_unchanged() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(3.0, 2.0);
        assert_eq!(clip_segment(a, b, 0.0, 0.0, 10.0, 10.0), Some((a, b)));
    }
}
