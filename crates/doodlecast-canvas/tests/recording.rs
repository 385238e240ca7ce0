//! Integration tests for the recording canvas.

use doodlecast_canvas::{Canvas, DrawCall, PenStyle, RecordingCanvas};
use doodlecast_protocol::Point;

#[test]
fn test_recording_canvas_records_calls_in_order() {
    let mut canvas = RecordingCanvas::new(16, 16);
    let pen = PenStyle::default();
    let a = Point::new(1.0, 1.0);
    let b = Point::new(6.0, 2.0);

    canvas.fill_dot(a, &pen);
    canvas.stroke_line(a, b, &pen);
    canvas.clear();

    assert_eq!(
        canvas.calls(),
        &[DrawCall::Dot(a), DrawCall::Line(a, b), DrawCall::Clear]
    );
    assert!(canvas.raster().is_blank());
}

#[test]
fn test_recording_canvas_draws_like_raster() {
    let mut canvas = RecordingCanvas::new(16, 16);
    let pen = PenStyle::default();

    canvas.stroke_line(Point::new(2.0, 2.0), Point::new(10.0, 8.0), &pen);

    assert!(!canvas.raster().is_blank());
    assert_eq!(canvas.take_calls().len(), 1);
    assert!(canvas.calls().is_empty());
}

#[test]
fn test_recording_canvas_snapshot_matches_raster() {
    let mut canvas = RecordingCanvas::new(8, 8);
    canvas.fill_dot(Point::new(3.0, 3.0), &PenStyle::default());

    let via_recording = canvas.snapshot_base64().unwrap();
    let via_raster = canvas.raster().snapshot_base64().unwrap();
    assert_eq!(via_recording, via_raster);
}
