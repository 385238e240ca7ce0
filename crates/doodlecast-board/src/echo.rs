//! Recognizes a board's own payloads when the channel hands them back.
//!
//! Once the channel has stamped a publish, its echo is matched by replay
//! id, so an echo that never arrives can't swallow a peer's identical
//! payload later on. Before the stamp is known, the echo can only be
//! matched by content.

use std::collections::{HashMap, VecDeque};

/// How many replay ids each list remembers.
const WINDOW: usize = 64;

#[derive(Debug, Default)]
pub(crate) struct EchoFilter {
    /// Published payloads the channel hasn't stamped yet.
    in_flight: HashMap<String, usize>,
    /// Stamped publishes whose echo hasn't arrived.
    stamped: VecDeque<u64>,
    /// Echoes matched by content before their stamp came back.
    matched_early: VecDeque<u64>,
}

impl EchoFilter {
    /// A publish of `payload` is under way.
    pub(crate) fn sent(&mut self, payload: &str) {
        *self.in_flight.entry(payload.to_string()).or_default() += 1;
    }

    /// The channel accepted `payload` as `replay_id`.
    pub(crate) fn stamped(&mut self, payload: &str, replay_id: u64) {
        if remove_id(&mut self.matched_early, replay_id) {
            return;
        }
        self.take_in_flight(payload);
        push_bounded(&mut self.stamped, replay_id);
    }

    /// The channel refused `payload`; no echo will come.
    pub(crate) fn failed(&mut self, payload: &str) {
        self.take_in_flight(payload);
    }

    /// Returns `true`, once, for the echo of one of our own publishes.
    pub(crate) fn is_echo(&mut self, replay_id: u64, payload: &str) -> bool {
        if remove_id(&mut self.stamped, replay_id) {
            return true;
        }
        if self.take_in_flight(payload) {
            push_bounded(&mut self.matched_early, replay_id);
            return true;
        }
        false
    }

    fn take_in_flight(&mut self, payload: &str) -> bool {
        let Some(count) = self.in_flight.get_mut(payload) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.in_flight.remove(payload);
        }
        true
    }
}

fn remove_id(ids: &mut VecDeque<u64>, replay_id: u64) -> bool {
    match ids.iter().position(|&id| id == replay_id) {
        Some(i) => {
            ids.remove(i);
            true
        }
        None => false,
    }
}

fn push_bounded(ids: &mut VecDeque<u64>, replay_id: u64) {
    if ids.len() == WINDOW {
        ids.pop_front();
    }
    ids.push_back(replay_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_after_stamp_is_matched_by_id() {
        let mut filter = EchoFilter::default();
        filter.sent("erase");
        filter.stamped("erase", 4);

        assert!(filter.is_echo(4, "erase"));
        assert!(!filter.is_echo(5, "erase"));
    }

    #[test]
    fn test_echo_before_stamp_is_matched_by_content() {
        let mut filter = EchoFilter::default();
        filter.sent("erase");

        assert!(filter.is_echo(4, "erase"));
        filter.stamped("erase", 4);

        assert!(filter.in_flight.is_empty());
        assert!(filter.stamped.is_empty());
        assert!(filter.matched_early.is_empty());
    }

    #[test]
    fn test_lost_echo_does_not_swallow_peer_payload() {
        let mut filter = EchoFilter::default();
        filter.sent("erase");
        filter.stamped("erase", 4);

        // Our echo for 4 never shows up; a peer erases later.
        assert!(!filter.is_echo(9, "erase"));
    }

    #[test]
    fn test_failed_publish_is_forgotten() {
        let mut filter = EchoFilter::default();
        filter.sent("erase");
        filter.failed("erase");

        assert!(!filter.is_echo(1, "erase"));
    }

    #[test]
    fn test_identical_publishes_each_echo_once() {
        let mut filter = EchoFilter::default();
        filter.sent("erase");
        filter.sent("erase");
        filter.stamped("erase", 2);

        assert!(filter.is_echo(3, "erase"));
        assert!(filter.is_echo(2, "erase"));
        filter.stamped("erase", 3);
        assert!(!filter.is_echo(7, "erase"));
    }

    #[test]
    fn test_remembered_ids_are_bounded() {
        let mut filter = EchoFilter::default();
        for id in 0..(WINDOW as u64 * 2) {
            filter.sent("x");
            filter.stamped("x", id);
        }
        assert_eq!(filter.stamped.len(), WINDOW);
        assert!(!filter.is_echo(0, "y"));
        assert!(filter.is_echo(WINDOW as u64 * 2 - 1, "y"));
    }
}
