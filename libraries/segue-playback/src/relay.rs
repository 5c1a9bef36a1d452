//! Completion relay
//!
//! Bridges "track ended" notifications from the device's own threads into
//! the session worker. The relay never touches session state; it only posts
//! a [`CompletionSignal`] onto the worker's channel.
//!
//! ```text
//! Device thread                 Session worker
//!      │                              │
//!      │  completion.notify(err)      │
//!      │─────────────────────────────>│ session.complete(generation, err)
//!      │                              │   -> advance()
//! ```

use crate::device::DeviceError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Completion posted to the session worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    /// Generation of the `start` this completion belongs to
    pub generation: u64,

    /// Error reported by the device, if playback failed
    pub error: Option<DeviceError>,
}

/// Sending half of a session's completion channel
#[derive(Debug, Clone)]
pub struct CompletionRelay {
    tx: Sender<CompletionSignal>,
}

impl CompletionRelay {
    /// Create a relay and the receiver the session worker drains
    pub fn channel() -> (Self, Receiver<CompletionSignal>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    /// Token handed to the device for one `start`
    pub(crate) fn completion(&self, generation: u64) -> Completion {
        Completion {
            generation,
            tx: self.tx.clone(),
        }
    }
}

/// One-start completion token given to a [`PlaybackDevice`]
///
/// `Send + Sync` and cheap to clone. Notifying more than once is harmless:
/// the session applies only the first notification for a generation.
///
/// [`PlaybackDevice`]: crate::device::PlaybackDevice
#[derive(Debug, Clone)]
pub struct Completion {
    generation: u64,
    tx: Sender<CompletionSignal>,
}

impl Completion {
    /// Report that the track ended, optionally with a device error
    ///
    /// Never blocks. If the session is gone the notification is dropped.
    pub fn notify(&self, error: Option<DeviceError>) {
        let signal = CompletionSignal {
            generation: self.generation,
            error,
        };
        if self.tx.send(signal).is_err() {
            debug!(
                "Session gone, dropping completion for generation {}",
                self.generation
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_posts_signal() {
        let (relay, rx) = CompletionRelay::channel();
        let completion = relay.completion(7);

        completion.notify(Some(DeviceError::new("decoder died")));

        let signal = rx.try_recv().unwrap();
        assert_eq!(signal.generation, 7);
        assert_eq!(signal.error, Some(DeviceError::new("decoder died")));
    }

    #[test]
    fn notify_after_session_gone_is_dropped() {
        let (relay, rx) = CompletionRelay::channel();
        let completion = relay.completion(1);
        drop(rx);

        // Must not panic or block
        completion.notify(None);
    }

    #[test]
    fn notify_from_other_thread() {
        let (relay, rx) = CompletionRelay::channel();
        let completion = relay.completion(3);

        std::thread::spawn(move || completion.notify(None))
            .join()
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().generation, 3);
    }
}
