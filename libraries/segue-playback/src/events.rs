//! Command outcomes and session events
//!
//! `Outcome` is the synchronous answer to a command. `SessionEvent` is
//! emitted by the session whenever state changes, including changes driven
//! by the completion path that no caller is waiting on:
//! - Track starts (after enqueue, advance, step-back)
//! - Queue runs dry
//! - Device reported an error or the watchdog fired

use crate::types::{PlaybackStatus, TrackRef};
use serde::Serialize;

/// Result of a command that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Tracks appended to the pending queue
    Enqueued {
        /// Number of tracks accepted
        added: usize,
        /// Pending length afterwards
        pending: usize,
        /// Track started as a consequence, if the session was idle
        now_playing: Option<TrackRef>,
    },

    /// A track was started on the device
    NowPlaying(TrackRef),

    /// Session already has a track on the device
    AlreadyPlaying,

    /// Nothing pending to start
    QueueEmpty,

    Paused,

    Resumed,

    /// Session already in the requested state
    NothingToDo,

    /// Current track is being stopped; `next` is what the advance will pick
    Skipping { next: Option<TrackRef> },

    /// Pending queue cleared, current track dropped
    Stopped {
        /// Whether a track was playing or paused
        interrupted: bool,
        /// Pending tracks removed
        cleared: usize,
    },

    /// Restoring a track from history
    SteppingBack(TrackRef),
}

/// Events emitted by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    /// A track started on the device
    NowPlaying(TrackRef),

    /// Advance found nothing pending
    QueueEmpty,

    /// Status transition
    StatusChanged(PlaybackStatus),

    /// Device reported an error for a track (or it timed out)
    TrackFailed { track: Option<TrackRef>, reason: String },

    /// Pending queue length changed
    QueueChanged { pending: usize },
}
