//! Pending queue and history store
//!
//! ```text
//! Current: Track A            (owned by the session, not stored here)
//! ─────────────────────────────
//! Pending (FIFO, head first):
//!   - Track B
//!   - Track C
//! ─────────────────────────────
//! History (most recent first):
//!   - Track Z
//!   - Track Y
//! ```

use crate::history::History;
use crate::types::{PlaybackStatus, TrackRef};
use serde::Serialize;
use std::collections::VecDeque;

/// Ordered pending queue plus bounded history
///
/// Pure data structure. It never duplicates a track: every operation moves
/// a `TrackRef` in or out, it does not copy one.
#[derive(Debug, Clone)]
pub struct QueueStore {
    /// Tracks waiting to play (head = next)
    pending: VecDeque<TrackRef>,

    /// Previously played tracks
    history: History,
}

impl QueueStore {
    /// Create an empty store with the given history bound
    pub fn new(history_size: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            history: History::new(history_size),
        }
    }

    /// Append one track to the tail
    ///
    /// Returns the new pending length.
    pub fn enqueue_one(&mut self, track: TrackRef) -> usize {
        self.pending.push_back(track);
        self.pending.len()
    }

    /// Append tracks to the tail, preserving their order
    ///
    /// Returns how many were accepted.
    pub fn enqueue_many(&mut self, tracks: impl IntoIterator<Item = TrackRef>) -> usize {
        let before = self.pending.len();
        self.pending.extend(tracks);
        self.pending.len() - before
    }

    /// Remove and return the head of the pending queue
    pub fn dequeue_next(&mut self) -> Option<TrackRef> {
        self.pending.pop_front()
    }

    /// Re-insert a track ahead of everything pending
    pub fn push_front(&mut self, track: TrackRef) {
        self.pending.push_front(track);
    }

    /// Record a track as most recently played
    ///
    /// Returns the entry evicted by the history bound, if any.
    pub fn push_history(&mut self, track: TrackRef) -> Option<TrackRef> {
        self.history.push(track)
    }

    /// Remove and return the most recently played track
    pub fn pop_history(&mut self) -> Option<TrackRef> {
        self.history.pop()
    }

    /// Drop every pending track
    ///
    /// Returns how many were removed.
    pub fn clear_pending(&mut self) -> usize {
        let removed = self.pending.len();
        self.pending.clear();
        removed
    }

    /// Peek at the next track without removing it
    pub fn peek_next(&self) -> Option<&TrackRef> {
        self.pending.front()
    }

    /// Pending tracks in play order
    pub fn pending(&self) -> impl Iterator<Item = &TrackRef> {
        self.pending.iter()
    }

    /// History, most recent first
    pub fn history(&self) -> impl Iterator<Item = &TrackRef> {
        self.history.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Up to `limit` pending tracks plus the true pending count
    pub fn snapshot(&self, limit: usize) -> PendingPreview {
        PendingPreview {
            upcoming: self.pending.iter().take(limit).cloned().collect(),
            total: self.pending.len(),
        }
    }
}

/// Read-only preview of the pending queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPreview {
    /// First tracks in play order, capped by the requested limit
    pub upcoming: Vec<TrackRef>,

    /// Number of pending tracks, regardless of the cap
    pub total: usize,
}

impl PendingPreview {
    /// Tracks beyond the cap
    pub fn hidden(&self) -> usize {
        self.total.saturating_sub(self.upcoming.len())
    }
}

/// Read-only view of a whole session for presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub status: PlaybackStatus,

    /// Track in the current slot
    pub current: Option<TrackRef>,

    /// Pending preview (display-capped)
    pub pending: PendingPreview,

    pub history_len: usize,
}

impl QueueSnapshot {
    /// Pending tracks plus the current one
    pub fn total(&self) -> usize {
        self.pending.total + usize::from(self.current.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(title: &str) -> TrackRef {
        TrackRef::new(format!("https://music.test/{title}"), Some(title.to_string())).unwrap()
    }

    fn titles<'a>(tracks: impl Iterator<Item = &'a TrackRef>) -> Vec<&'a str> {
        tracks.map(|t| t.title()).collect()
    }

    #[test]
    fn create_empty_store() {
        let store = QueueStore::new(10);
        assert!(store.is_empty());
        assert_eq!(store.pending_len(), 0);
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn enqueue_is_fifo() {
        let mut store = QueueStore::new(10);
        assert_eq!(store.enqueue_one(create_test_track("A")), 1);
        assert_eq!(store.enqueue_one(create_test_track("B")), 2);

        assert_eq!(store.dequeue_next().unwrap().title(), "A");
        assert_eq!(store.dequeue_next().unwrap().title(), "B");
        assert!(store.dequeue_next().is_none());
    }

    #[test]
    fn enqueue_many_preserves_order() {
        let mut store = QueueStore::new(10);
        store.enqueue_one(create_test_track("A"));

        let added = store.enqueue_many(vec![
            create_test_track("B"),
            create_test_track("C"),
            create_test_track("D"),
        ]);

        assert_eq!(added, 3);
        assert_eq!(titles(store.pending()), ["A", "B", "C", "D"]);
    }

    #[test]
    fn enqueue_many_empty_adds_nothing() {
        let mut store = QueueStore::new(10);
        assert_eq!(store.enqueue_many(Vec::new()), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn dequeue_does_not_touch_history() {
        let mut store = QueueStore::new(10);
        store.enqueue_one(create_test_track("A"));
        store.dequeue_next();
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn push_front_goes_ahead_of_pending() {
        let mut store = QueueStore::new(10);
        store.enqueue_one(create_test_track("B"));
        store.push_front(create_test_track("A"));

        assert_eq!(store.peek_next().unwrap().title(), "A");
        assert_eq!(titles(store.pending()), ["A", "B"]);
    }

    #[test]
    fn history_is_most_recent_first() {
        let mut store = QueueStore::new(10);
        store.push_history(create_test_track("A"));
        store.push_history(create_test_track("B"));

        assert_eq!(titles(store.history()), ["B", "A"]);
        assert_eq!(store.pop_history().unwrap().title(), "B");
        assert_eq!(store.pop_history().unwrap().title(), "A");
        assert!(store.pop_history().is_none());
    }

    #[test]
    fn clear_pending_keeps_history() {
        let mut store = QueueStore::new(10);
        store.enqueue_many(vec![create_test_track("A"), create_test_track("B")]);
        store.push_history(create_test_track("Z"));

        assert_eq!(store.clear_pending(), 2);
        assert!(store.is_empty());
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn snapshot_caps_but_reports_true_count() {
        let mut store = QueueStore::new(10);
        store.enqueue_many((0..15).map(|i| create_test_track(&i.to_string())));

        let preview = store.snapshot(10);
        assert_eq!(preview.upcoming.len(), 10);
        assert_eq!(preview.total, 15);
        assert_eq!(preview.hidden(), 5);
        assert_eq!(preview.upcoming[0].title(), "0");

        // Read-only
        assert_eq!(store.pending_len(), 15);
    }

    #[test]
    fn snapshot_total_counts_current() {
        let snapshot = QueueSnapshot {
            status: PlaybackStatus::Playing,
            current: Some(create_test_track("A")),
            pending: PendingPreview {
                upcoming: vec![create_test_track("B")],
                total: 1,
            },
            history_len: 0,
        };
        assert_eq!(snapshot.total(), 2);
    }
}
