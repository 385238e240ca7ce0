//! Core stroke types and channel identifiers.
//!
//! A drawing travels as a *script*: the exact sequence of pen-down,
//! pen-drag and pen-up events the sender produced. Replaying the script
//! in order redraws the picture.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A position in canvas-local pixel space.
///
/// Coordinates are `f64` because pointer input arrives with sub-pixel
/// precision; the raster decides how to snap them to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point from its two coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// StrokeEvent
// ---------------------------------------------------------------------------

/// One step of a stroke.
///
/// Within a stroke there is exactly one `Start`, then any number of
/// `Segment`s whose endpoints chain (`from` of each segment is the `to`
/// of the previous one, or the `Start` point for the first), then one
/// `End`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeEvent {
    /// Pen down: a new stroke begins at `at`.
    Start { at: Point },
    /// Pen drag: a straight line extends the current stroke.
    Segment { from: Point, to: Point },
    /// Pen up: the current stroke is finished.
    End,
}

impl StrokeEvent {
    /// Short lowercase name of the variant, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Segment { .. } => "segment",
            Self::End => "end",
        }
    }
}

// ---------------------------------------------------------------------------
// StrokeLog
// ---------------------------------------------------------------------------

/// The ordered list of stroke events recorded since the last flush.
///
/// Insertion order is the replay order. Only the local capture path
/// appends to a log; replayed remote strokes never do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeLog {
    events: Vec<StrokeEvent>,
}

impl StrokeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event.
    pub fn push(&mut self, event: StrokeEvent) {
        self.events.push(event);
    }

    /// Returns the recorded events in order.
    pub fn events(&self) -> &[StrokeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Moves the recorded events out, leaving this log empty.
    pub fn take(&mut self) -> StrokeLog {
        std::mem::take(self)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StrokeEvent> {
        self.events.iter()
    }

    /// Checks the stroke grammar: every stroke is `Start`, chained
    /// `Segment`s, `End`, and no stroke is left open.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` naming the first event
    /// that breaks the order.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let mut cursor: Option<Point> = None;

        for (index, event) in self.events.iter().enumerate() {
            cursor = match (*event, cursor) {
                (StrokeEvent::Start { at }, None) => Some(at),
                (StrokeEvent::Segment { from, to }, Some(last))
                    if from == last =>
                {
                    Some(to)
                }
                (StrokeEvent::End, Some(_)) => None,
                (event, _) => {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "{} at index {index} breaks the stroke order",
                        event.kind()
                    )));
                }
            };
        }

        if cursor.is_some() {
            return Err(ProtocolError::InvalidMessage(
                "last stroke has no end".into(),
            ));
        }
        Ok(())
    }
}

impl From<Vec<StrokeEvent>> for StrokeLog {
    fn from(events: Vec<StrokeEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<StrokeEvent> for StrokeLog {
    fn from_iter<I: IntoIterator<Item = StrokeEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StrokeLog {
    type Item = &'a StrokeEvent;
    type IntoIter = std::slice::Iter<'a, StrokeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// ---------------------------------------------------------------------------
// Channel identifiers
// ---------------------------------------------------------------------------

/// Identifies one subscription on a channel.
///
/// `#[serde(transparent)]` writes it as a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Where a new subscription starts reading a topic.
///
/// On the wire this is a single integer:
///
/// | position | meaning |
/// |---|---|
/// | `-1` | only events published after subscribing |
/// | `-2` | every event the channel still retains |
/// | `n >= 0` | retained events with a replay id greater than `n` |
///
/// `#[serde(try_from = "i64", into = "i64")]` routes serde through the
/// conversions below, so an out-of-range integer fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ReplayFrom {
    NewOnly,
    AllRetained,
    After(u64),
}

impl ReplayFrom {
    /// Parses a wire position.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidReplayPosition` for negative values
    /// other than `-1` and `-2`.
    pub fn from_position(position: i64) -> Result<Self, ProtocolError> {
        match position {
            -1 => Ok(Self::NewOnly),
            -2 => Ok(Self::AllRetained),
            n if n >= 0 => Ok(Self::After(n as u64)),
            n => Err(ProtocolError::InvalidReplayPosition(n)),
        }
    }

    /// The wire position for this starting point.
    pub fn position(self) -> i64 {
        match self {
            Self::NewOnly => -1,
            Self::AllRetained => -2,
            Self::After(id) => i64::try_from(id).unwrap_or(i64::MAX),
        }
    }

    /// Returns `true` if a retained event with `replay_id` should be
    /// replayed to a subscriber starting here.
    pub fn includes(self, replay_id: u64) -> bool {
        match self {
            Self::NewOnly => false,
            Self::AllRetained => true,
            Self::After(after) => replay_id > after,
        }
    }
}

impl TryFrom<i64> for ReplayFrom {
    type Error = ProtocolError;

    fn try_from(position: i64) -> Result<Self, Self::Error> {
        Self::from_position(position)
    }
}

impl From<ReplayFrom> for i64 {
    fn from(replay: ReplayFrom) -> Self {
        replay.position()
    }
}

impl fmt::Display for ReplayFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position())
    }
}
