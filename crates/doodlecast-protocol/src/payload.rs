//! The drawing payload and its wire form.
//!
//! On the wire a payload is always a string:
//!
//! - the literal `erase`, meaning "clear the canvas, drop the log", or
//! - a JSON array of tagged records, one per stroke event:
//!
//! ```text
//! [
//!   { "startData":   { "type": "start",   "prevX": 10, "prevY": 10, "currX": 10, "currY": 10 } },
//!   { "drawingData": { "type": "drawing", "prevX": 10, "prevY": 10, "currX": 20, "currY": 20 } },
//!   { "endData":     { "type": "end" } }
//! ]
//! ```
//!
//! The single key of each record is the discriminant. Serde's default
//! *externally tagged* enum representation is exactly that shape, so the
//! record type below is a plain enum and decoding is exhaustive: a record
//! with an unknown key, or with more than one key, fails to decode.

use serde::{Deserialize, Serialize};

use crate::{Point, ProtocolError, StrokeEvent, StrokeLog};

/// The reserved payload that tells every peer to wipe its canvas.
pub const ERASE_SENTINEL: &str = "erase";

/// What a flush hands to the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Clear the canvas and discard the log.
    Erase,
    /// Replay these strokes.
    Strokes(StrokeLog),
}

/// The result of decoding a wire payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub payload: Payload,
    /// Records that were present but not recognized, and were left out.
    pub skipped: usize,
}

impl Payload {
    /// Returns `true` for the erase sentinel.
    pub fn is_erase(&self) -> bool {
        matches!(self, Self::Erase)
    }

    /// Writes this payload in its wire form.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if JSON serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            Self::Erase => Ok(ERASE_SENTINEL.to_string()),
            Self::Strokes(log) => {
                let records: Vec<WireRecord> =
                    log.iter().map(WireRecord::from).collect();
                serde_json::to_string(&records).map_err(ProtocolError::Encode)
            }
        }
    }

    /// Reads a wire payload.
    ///
    /// The sentinel is checked by exact comparison before any JSON
    /// parsing. Records that don't match one of the three shapes are
    /// skipped and counted in [`Decoded::skipped`]; the others are kept
    /// in order.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if `raw` is not the sentinel and
    /// not a JSON array.
    pub fn decode(raw: &str) -> Result<Decoded, ProtocolError> {
        if raw == ERASE_SENTINEL {
            return Ok(Decoded {
                payload: Self::Erase,
                skipped: 0,
            });
        }

        let records: Vec<serde_json::Value> =
            serde_json::from_str(raw).map_err(ProtocolError::Decode)?;

        let mut log = StrokeLog::new();
        let mut skipped = 0;
        for (index, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<WireRecord>(value) {
                Ok(record) => log.push(record.into()),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        index,
                        error = %e,
                        "skipping unrecognized stroke record"
                    );
                }
            }
        }

        Ok(Decoded {
            payload: Self::Strokes(log),
            skipped,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// Coordinates carried by start and drawing records.
///
/// `type` is written for peers that expect it and ignored when reading.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct XyData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    prev_x: f64,
    prev_y: f64,
    curr_x: f64,
    curr_y: f64,
}

impl XyData {
    fn new(kind: &str, prev: Point, curr: Point) -> Self {
        Self {
            kind: Some(kind.to_string()),
            prev_x: prev.x,
            prev_y: prev.y,
            curr_x: curr.x,
            curr_y: curr.y,
        }
    }

    fn prev(&self) -> Point {
        Point::new(self.prev_x, self.prev_y)
    }

    fn curr(&self) -> Point {
        Point::new(self.curr_x, self.curr_y)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EndData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
enum WireRecord {
    #[serde(rename = "startData")]
    Start(XyData),
    #[serde(rename = "drawingData")]
    Drawing(XyData),
    #[serde(rename = "endData")]
    End(EndData),
}

impl From<&StrokeEvent> for WireRecord {
    fn from(event: &StrokeEvent) -> Self {
        match *event {
            // A start has no meaningful previous point; repeat the start.
            StrokeEvent::Start { at } => Self::Start(XyData::new("start", at, at)),
            StrokeEvent::Segment { from, to } => {
                Self::Drawing(XyData::new("drawing", from, to))
            }
            StrokeEvent::End => Self::End(EndData {
                kind: Some("end".to_string()),
            }),
        }
    }
}

impl From<WireRecord> for StrokeEvent {
    fn from(record: WireRecord) -> Self {
        match record {
            WireRecord::Start(xy) => Self::Start { at: xy.curr() },
            WireRecord::Drawing(xy) => Self::Segment {
                from: xy.prev(),
                to: xy.curr(),
            },
            WireRecord::End(_) => Self::End,
        }
    }
}
