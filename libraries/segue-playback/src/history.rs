//! Playback history tracking
//!
//! Bounded record of played tracks backing step-back navigation.

use crate::types::TrackRef;
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// The head (most recently played) is stored at the back of the buffer.
/// When full, the oldest entry is discarded.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    tracks: VecDeque<TrackRef>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size.min(64)),
            max_size,
        }
    }

    /// Record a track as the most recent entry
    ///
    /// Returns the evicted oldest entry, if the bound was hit.
    pub fn push(&mut self, track: TrackRef) -> Option<TrackRef> {
        if self.max_size == 0 {
            return Some(track);
        }

        let evicted = if self.tracks.len() >= self.max_size {
            self.tracks.pop_front()
        } else {
            None
        };
        self.tracks.push_back(track);
        evicted
    }

    /// Most recent track (without removing)
    pub fn peek(&self) -> Option<&TrackRef> {
        self.tracks.back()
    }

    /// Pop most recent track
    pub fn pop(&mut self) -> Option<TrackRef> {
        self.tracks.pop_back()
    }

    /// Iterate most recent first
    pub fn iter(&self) -> impl Iterator<Item = &TrackRef> {
        self.tracks.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
