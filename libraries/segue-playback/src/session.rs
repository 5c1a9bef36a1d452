//! Playback session - the queue/transition state machine
//!
//! Owns the current slot, the status and the [`QueueStore`], and commands a
//! [`PlaybackDevice`]. Single-threaded: the worker in `worker.rs` is the only
//! caller in production, which is what serializes commands and completions.
//!
//! ```text
//!            ensure_playing (pending)            completion (pending)
//!   Idle ─────────────────────────────> Playing <──────────────┐
//!    ^                                   │   ^                 │
//!    │ completion (queue empty)          │   │ resume          │
//!    │ stop                      pause   v   │                 │
//!    └──────────────────────────────── Paused ─── skip ────────┘
//! ```

use crate::{
    device::{DeviceError, PlaybackDevice},
    error::{PlaybackError, Result},
    events::{Outcome, SessionEvent},
    queue::{QueueSnapshot, QueueStore},
    relay::CompletionRelay,
    types::{PlaybackStatus, SessionConfig, TrackRef},
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Stall watchdog state for the track on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Watchdog {
    Disarmed,

    /// Playing, fires at the deadline
    Armed(Instant),

    /// Paused, remaining budget kept
    Frozen(Duration),
}

/// Per-device playback state machine
///
/// Invariants:
/// - `current` is `Some` exactly when `status` is `Playing` or `Paused`
/// - a `TrackRef` lives in at most one of pending, current, history
/// - at most one completion is applied per device `start`
pub struct PlaybackSession {
    status: PlaybackStatus,
    current: Option<TrackRef>,
    queue: QueueStore,

    device: Box<dyn PlaybackDevice>,
    relay: CompletionRelay,

    // Generation of the last `start`, and the one whose completion is still
    // outstanding. Completions for any other generation are stale.
    generation: u64,
    awaiting: Option<u64>,

    track_timeout: Option<Duration>,
    watchdog: Watchdog,
    display_limit: usize,

    // Event queue for the worker to publish
    pending_events: Vec<SessionEvent>,
}

impl PlaybackSession {
    /// Create an idle session bound to `device`
    ///
    /// `relay` is where the device's completions are posted; the caller
    /// drains the matching receiver and feeds [`Self::complete`].
    pub fn new(
        config: &SessionConfig,
        device: Box<dyn PlaybackDevice>,
        relay: CompletionRelay,
    ) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            current: None,
            queue: QueueStore::new(config.history_size),
            device,
            relay,
            generation: 0,
            awaiting: None,
            track_timeout: config.track_timeout(),
            watchdog: Watchdog::Disarmed,
            display_limit: config.display_limit,
            pending_events: Vec::new(),
        }
    }

    // ===== Queue =====

    /// Append one track; does not start playback
    pub fn enqueue_one(&mut self, track: TrackRef) -> Outcome {
        debug!("Enqueue {}", track);
        let pending = self.queue.enqueue_one(track);
        self.emit_queue_changed();
        Outcome::Enqueued {
            added: 1,
            pending,
            now_playing: None,
        }
    }

    /// Append tracks in order; does not start playback
    pub fn enqueue_many(&mut self, tracks: Vec<TrackRef>) -> Outcome {
        let added = self.append(tracks);
        Outcome::Enqueued {
            added,
            pending: self.queue.pending_len(),
            now_playing: None,
        }
    }

    /// Append tracks and start playback if the session is idle
    ///
    /// Zero accepted tracks never starts playback.
    pub fn play(&mut self, tracks: Vec<TrackRef>) -> Outcome {
        let added = self.append(tracks);

        let now_playing = if added > 0 {
            match self.ensure_playing() {
                Outcome::NowPlaying(track) => Some(track),
                _ => None,
            }
        } else {
            None
        };

        Outcome::Enqueued {
            added,
            pending: self.queue.pending_len(),
            now_playing,
        }
    }

    fn append(&mut self, tracks: Vec<TrackRef>) -> usize {
        let added = self.queue.enqueue_many(tracks);
        if added > 0 {
            debug!("Enqueued {} tracks", added);
            self.emit_queue_changed();
        }
        added
    }

    // ===== Playback Control =====

    /// Start the head of the queue if nothing is on the device
    pub fn ensure_playing(&mut self) -> Outcome {
        if self.status.is_active() || self.awaiting.is_some() {
            return Outcome::AlreadyPlaying;
        }

        match self.start_next() {
            Some(track) => Outcome::NowPlaying(track),
            None => Outcome::QueueEmpty,
        }
    }

    /// Pause the current track
    pub fn pause(&mut self) -> Outcome {
        if self.status != PlaybackStatus::Playing {
            return Outcome::NothingToDo;
        }

        self.device.pause();
        self.freeze_watchdog(Instant::now());
        self.set_status(PlaybackStatus::Paused);
        Outcome::Paused
    }

    /// Resume a paused track
    pub fn resume(&mut self) -> Outcome {
        if self.status != PlaybackStatus::Paused {
            return Outcome::NothingToDo;
        }

        self.device.resume();
        self.rearm_watchdog(Instant::now());
        self.set_status(PlaybackStatus::Playing);
        Outcome::Resumed
    }

    /// Stop the current track; the completion path advances
    ///
    /// With nothing pending the session ends up idle.
    pub fn skip(&mut self) -> Outcome {
        if !self.status.is_active() {
            return Outcome::NothingToDo;
        }

        debug!("Skipping {:?}", self.current.as_ref().map(TrackRef::title));
        self.device.stop();
        Outcome::Skipping {
            next: self.queue.peek_next().cloned(),
        }
    }

    /// Clear the pending queue and the current track
    ///
    /// Always succeeds. The stopped track is not recorded in history, and
    /// its completion is cancelled so it cannot trigger an advance.
    pub fn stop(&mut self) -> Outcome {
        // A step-back restore still has a track on the device while Idle
        let interrupted = self.awaiting.is_some() || self.status.is_active();
        let cleared = self.queue.clear_pending();

        self.current = None;
        self.watchdog = Watchdog::Disarmed;
        if self.awaiting.take().is_some() {
            self.device.stop();
        }
        self.set_status(PlaybackStatus::Idle);
        if cleared > 0 {
            self.emit_queue_changed();
        }

        debug!(
            "Stopped (interrupted: {}, cleared: {})",
            interrupted, cleared
        );
        Outcome::Stopped {
            interrupted,
            cleared,
        }
    }

    /// Go back to the most recently played track
    ///
    /// The displaced current track is put back at the front of the pending
    /// queue, behind the restored one. `current` is emptied before the device
    /// is stopped: the completion then advances without pushing anything into
    /// history, so neither track is duplicated there. The watchdog stays armed
    /// until that completion arrives.
    pub fn step_back(&mut self) -> Result<Outcome> {
        let prev = self.queue.pop_history().ok_or(PlaybackError::NoHistory)?;

        if let Some(current) = self.current.take() {
            self.queue.push_front(current);
        }
        self.queue.push_front(prev.clone());
        self.emit_queue_changed();

        if self.awaiting.is_some() {
            // Device still holds a track: let its completion start `prev`.
            self.arm_watchdog(Instant::now());
            self.set_status(PlaybackStatus::Idle);
            self.device.stop();
        } else {
            // Nothing on the device, no completion will come.
            self.ensure_playing();
        }

        info!("Going back to {}", prev);
        Ok(Outcome::SteppingBack(prev))
    }

    // ===== Completion path =====

    /// Apply a device completion
    ///
    /// Returns whether it was applied. Completions for a generation other
    /// than the outstanding one (duplicates, late arrivals after stop or a
    /// watchdog expiry) are ignored.
    pub fn complete(&mut self, generation: u64, error: Option<DeviceError>) -> bool {
        if self.awaiting != Some(generation) {
            debug!(
                "Ignoring stale completion (generation {}, awaiting {:?})",
                generation, self.awaiting
            );
            return false;
        }
        self.awaiting = None;

        if let Some(error) = error {
            warn!(
                "Player error on {:?}: {}",
                self.current.as_ref().map(TrackRef::title),
                error
            );
            self.pending_events.push(SessionEvent::TrackFailed {
                track: self.current.clone(),
                reason: error.to_string(),
            });
        }

        self.advance();
        true
    }

    /// Deadline of the stall watchdog, if armed
    pub fn watchdog_deadline(&self) -> Option<Instant> {
        match self.watchdog {
            Watchdog::Armed(deadline) => Some(deadline),
            Watchdog::Disarmed | Watchdog::Frozen(_) => None,
        }
    }

    /// Force an advance if the device overran its budget
    ///
    /// Covers a track stuck in Playing and a step-back whose stop was never
    /// confirmed. Returns whether the watchdog fired.
    pub fn check_watchdog(&mut self, now: Instant) -> bool {
        let Watchdog::Armed(deadline) = self.watchdog else {
            return false;
        };
        if now < deadline || self.awaiting.is_none() {
            return false;
        }

        warn!(
            "Track {:?} exceeded {:?} without completing, forcing advance",
            self.current.as_ref().map(TrackRef::title),
            self.track_timeout
        );
        self.pending_events.push(SessionEvent::TrackFailed {
            track: self.current.clone(),
            reason: "timed out".to_string(),
        });

        // The device's own completion for this generation is now stale.
        self.awaiting = None;
        self.device.stop();
        self.advance();
        true
    }

    /// Move `current` into history and start the next pending track
    fn advance(&mut self) {
        if let Some(finished) = self.current.take() {
            if let Some(evicted) = self.queue.push_history(finished) {
                debug!("History full, evicted {}", evicted);
            }
        }

        if self.start_next().is_none() {
            info!("Queue is now empty");
            self.pending_events.push(SessionEvent::QueueEmpty);
        }
    }

    /// Pop the head of the queue onto the device
    ///
    /// Leaves the session idle when nothing is pending.
    fn start_next(&mut self) -> Option<TrackRef> {
        let Some(track) = self.queue.dequeue_next() else {
            self.current = None;
            self.watchdog = Watchdog::Disarmed;
            self.set_status(PlaybackStatus::Idle);
            return None;
        };

        self.generation += 1;
        self.awaiting = Some(self.generation);
        self.current = Some(track.clone());
        self.device.start(&track, self.relay.completion(self.generation));
        self.arm_watchdog(Instant::now());

        info!("Now playing: {}", track);
        self.set_status(PlaybackStatus::Playing);
        self.pending_events.push(SessionEvent::NowPlaying(track.clone()));
        self.emit_queue_changed();
        Some(track)
    }

    // ===== Watchdog =====

    fn arm_watchdog(&mut self, now: Instant) {
        self.watchdog = match self.track_timeout {
            Some(timeout) => now
                .checked_add(timeout)
                .map_or(Watchdog::Disarmed, Watchdog::Armed),
            None => Watchdog::Disarmed,
        };
    }

    fn freeze_watchdog(&mut self, now: Instant) {
        if let Watchdog::Armed(deadline) = self.watchdog {
            self.watchdog = Watchdog::Frozen(deadline.saturating_duration_since(now));
        }
    }

    fn rearm_watchdog(&mut self, now: Instant) {
        if let Watchdog::Frozen(remaining) = self.watchdog {
            self.watchdog = now
                .checked_add(remaining)
                .map_or(Watchdog::Disarmed, Watchdog::Armed);
        }
    }

    // ===== State Queries =====

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current(&self) -> Option<&TrackRef> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    /// Read-only view, pending preview capped at `limit` (or the configured
    /// display limit)
    pub fn snapshot(&self, limit: Option<usize>) -> QueueSnapshot {
        QueueSnapshot {
            status: self.status,
            current: self.current.clone(),
            pending: self.queue.snapshot(limit.unwrap_or(self.display_limit)),
            history_len: self.queue.history_len(),
        }
    }

    // ===== Events =====

    /// Take all events accumulated since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            debug!("Status {:?} -> {:?}", self.status, status);
            self.status = status;
            self.pending_events.push(SessionEvent::StatusChanged(status));
        }
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(SessionEvent::QueueChanged {
            pending: self.queue.pending_len(),
        });
    }
}
