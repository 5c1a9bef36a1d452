//! Segue - Playback Sequencing
//!
//! Per-session media queue and playback state machine, independent of any
//! chat front-end or audio backend.
//!
//! This crate provides:
//! - Ordered pending queue with bounded playback history
//! - Playback state machine (enqueue, play, pause, resume, skip, stop, back)
//! - Completion relay from device threads into the session's worker
//! - Session registry keyed by device binding
//! - Resolver contract for turning user queries into tracks
//!
//! # Architecture
//!
//! Every session runs on its own worker thread. Callers go through a
//! [`SessionHandle`]; the device reports track ends through the
//! [`Completion`] token it received with each `start`. Both are serialized
//! onto the worker, so the queue is never mutated concurrently.
//!
//! Audio output is provided by implementing [`PlaybackDevice`].
//!
//! # Example
//!
//! ```rust
//! use segue_playback::{
//!     Completion, Outcome, PlaybackDevice, SessionConfig, SessionRegistry, TrackRef,
//! };
//!
//! // A device that ends a track only when told to stop
//! struct Speaker {
//!     playing: Option<Completion>,
//! }
//!
//! impl PlaybackDevice for Speaker {
//!     fn start(&mut self, _track: &TrackRef, completion: Completion) {
//!         self.playing = Some(completion);
//!     }
//!
//!     fn pause(&mut self) {}
//!
//!     fn resume(&mut self) {}
//!
//!     fn stop(&mut self) {
//!         if let Some(completion) = self.playing.take() {
//!             completion.notify(None);
//!         }
//!     }
//! }
//!
//! let registry = SessionRegistry::new(SessionConfig::default())?;
//! let session = registry.join("guild-1", Box::new(Speaker { playing: None }))?;
//!
//! let track = TrackRef::new("https://example.com/song.mp3", Some("Song".to_string()))?;
//! let outcome = session.play(vec![track])?;
//! assert!(matches!(outcome, Outcome::Enqueued { now_playing: Some(_), .. }));
//!
//! registry.leave(&"guild-1".into())?;
//! # Ok::<(), segue_playback::PlaybackError>(())
//! ```

mod device;
mod error;
mod events;
mod history;
mod queue;
mod registry;
mod relay;
pub mod resolver;
mod session;
pub mod types;
mod worker;

// Public exports
pub use device::{DeviceError, PlaybackDevice};
pub use error::{PlaybackError, Result};
pub use events::{Outcome, SessionEvent};
pub use queue::{PendingPreview, QueueSnapshot, QueueStore};
pub use registry::SessionRegistry;
pub use relay::{Completion, CompletionRelay, CompletionSignal};
pub use resolver::{Resolution, ResolvedEntry, Resolver};
pub use session::PlaybackSession;
pub use types::{
    BindingId, PlaybackStatus, SessionConfig, TrackId, TrackRef, MAX_TRACK_TIMEOUT_SECS,
    UNKNOWN_TITLE,
};
pub use worker::{PlayReport, SessionHandle};
