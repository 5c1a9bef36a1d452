//! Playback device contract
//!
//! The session only issues commands. Audio output, connection handling and
//! decoding belong to the implementor.

use crate::relay::Completion;
use crate::types::TrackRef;
use thiserror::Error;

/// Error reported by a device alongside a completion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DeviceError(pub String);

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A single playback device driven by one session
///
/// Commands are fire-and-forget and must not block on I/O. For every
/// `start` the device must eventually call [`Completion::notify`] exactly
/// once, from any thread, including when the track is ended by `stop`.
pub trait PlaybackDevice: Send {
    /// Begin rendering `track`
    fn start(&mut self, track: &TrackRef, completion: Completion);

    /// Suspend rendering of the current track
    fn pause(&mut self);

    /// Continue rendering after `pause`
    fn resume(&mut self);

    /// End the current track (its completion still fires)
    fn stop(&mut self);
}

impl<D: PlaybackDevice + ?Sized> PlaybackDevice for Box<D> {
    fn start(&mut self, track: &TrackRef, completion: Completion) {
        (**self).start(track, completion);
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn resume(&mut self) {
        (**self).resume();
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}
