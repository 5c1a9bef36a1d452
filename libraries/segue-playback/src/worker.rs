//! Session worker
//!
//! Each session is owned by one dedicated thread. Commands from callers,
//! completions from the device and watchdog ticks are all handled on that
//! thread, one at a time, in arrival order.
//!
//! ```text
//! Caller threads          Session worker              Device threads
//!      │                        │                           │
//!      │  SessionCommand        │                           │
//!      │───────────────────────>│ session.skip()            │
//!      │<───────────────────────│ Outcome                   │
//!      │                        │ device.stop() ───────────>│
//!      │                        │                           │
//!      │                        │<──────────────────────────│ completion.notify()
//!      │   SessionEvent         │ session.complete()        │
//!      │<───────────────────────│                           │
//! ```

use crate::{
    device::PlaybackDevice,
    error::{PlaybackError, Result},
    events::{Outcome, SessionEvent},
    queue::QueueSnapshot,
    relay::{CompletionRelay, CompletionSignal},
    resolver::{resolve_tracks, Resolver},
    session::PlaybackSession,
    types::{BindingId, SessionConfig, TrackRef},
};
use crossbeam_channel::{after, bounded, never, select, unbounded, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// Events buffered for listeners before new ones are dropped
const EVENT_BUFFER: usize = 256;

type Reply<T> = Sender<T>;

/// Requests handled by the session worker
enum SessionCommand {
    EnqueueOne(TrackRef, Reply<Outcome>),
    EnqueueMany(Vec<TrackRef>, Reply<Outcome>),
    Play(Vec<TrackRef>, Reply<Outcome>),
    EnsurePlaying(Reply<Outcome>),
    Pause(Reply<Outcome>),
    Resume(Reply<Outcome>),
    Skip(Reply<Outcome>),
    Stop(Reply<Outcome>),
    StepBack(Reply<Result<Outcome>>),
    Snapshot(Option<usize>, Reply<QueueSnapshot>),
    Shutdown(Reply<Outcome>),
}

/// Result of [`SessionHandle::play_query`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayReport {
    /// Set when the query resolved to a playlist
    pub playlist_title: Option<String>,

    /// Playlist entries that had nothing playable
    pub skipped: usize,

    pub outcome: Outcome,
}

/// Thread-safe handle to a running session
///
/// Cheap to clone. Every call blocks until the worker has applied it, so
/// calls from one thread observe their own effects in order. Once the
/// session is shut down every call fails with
/// [`PlaybackError::DeviceUnavailable`].
#[derive(Clone)]
pub struct SessionHandle {
    binding: BindingId,
    commands: Sender<SessionCommand>,
    events: Receiver<SessionEvent>,
}

impl SessionHandle {
    /// Start a worker thread owning a new session for `device`
    pub fn spawn(
        binding: BindingId,
        config: &SessionConfig,
        device: Box<dyn PlaybackDevice>,
    ) -> Result<Self> {
        config.validate()?;

        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = bounded(EVENT_BUFFER);
        let (relay, completion_rx) = CompletionRelay::channel();
        let session = PlaybackSession::new(config, device, relay);

        let worker = SessionWorker {
            binding: binding.clone(),
            session,
            commands: command_rx,
            completions: completion_rx,
            events: event_tx,
        };

        thread::Builder::new()
            .name(format!("segue-session-{binding}"))
            .spawn(move || worker.run())
            .map_err(|e| {
                error!("Failed to spawn session worker for {}: {}", binding, e);
                PlaybackError::DeviceUnavailable
            })?;

        Ok(Self {
            binding,
            commands: command_tx,
            events: event_rx,
        })
    }

    pub fn binding(&self) -> &BindingId {
        &self.binding
    }

    /// Events published by the session
    ///
    /// Shared by every clone of this handle: each event is delivered to one
    /// receiver.
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Append one track without starting playback
    pub fn enqueue_one(&self, track: TrackRef) -> Result<Outcome> {
        self.request(|reply| SessionCommand::EnqueueOne(track, reply))
    }

    /// Append tracks without starting playback
    pub fn enqueue_many(&self, tracks: Vec<TrackRef>) -> Result<Outcome> {
        self.request(|reply| SessionCommand::EnqueueMany(tracks, reply))
    }

    /// Append tracks and start playback if idle
    pub fn play(&self, tracks: Vec<TrackRef>) -> Result<Outcome> {
        self.request(|reply| SessionCommand::Play(tracks, reply))
    }

    /// Resolve `query` on this thread, then enqueue and start playback
    ///
    /// Resolution errors leave the queue untouched.
    pub fn play_query(&self, resolver: &dyn Resolver, query: &str) -> Result<PlayReport> {
        let resolved = resolve_tracks(resolver, query)?;
        let outcome = self.play(resolved.tracks)?;
        Ok(PlayReport {
            playlist_title: resolved.playlist_title,
            skipped: resolved.skipped,
            outcome,
        })
    }

    pub fn ensure_playing(&self) -> Result<Outcome> {
        self.request(SessionCommand::EnsurePlaying)
    }

    pub fn pause(&self) -> Result<Outcome> {
        self.request(SessionCommand::Pause)
    }

    pub fn resume(&self) -> Result<Outcome> {
        self.request(SessionCommand::Resume)
    }

    pub fn skip(&self) -> Result<Outcome> {
        self.request(SessionCommand::Skip)
    }

    pub fn stop(&self) -> Result<Outcome> {
        self.request(SessionCommand::Stop)
    }

    pub fn step_back(&self) -> Result<Outcome> {
        self.request(SessionCommand::StepBack)?
    }

    /// Current state, pending preview capped at `limit` or the configured
    /// display limit
    pub fn snapshot(&self, limit: Option<usize>) -> Result<QueueSnapshot> {
        self.request(|reply| SessionCommand::Snapshot(limit, reply))
    }

    /// Stop playback, clear the queue and end the worker
    pub fn shutdown(&self) -> Result<Outcome> {
        self.request(SessionCommand::Shutdown)
    }

    fn request<T>(&self, command: impl FnOnce(Reply<T>) -> SessionCommand) -> Result<T> {
        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(command(reply_tx))
            .map_err(|_| PlaybackError::DeviceUnavailable)?;
        reply_rx.recv().map_err(|_| PlaybackError::DeviceUnavailable)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

struct SessionWorker {
    binding: BindingId,
    session: PlaybackSession,
    commands: Receiver<SessionCommand>,
    completions: Receiver<CompletionSignal>,
    events: Sender<SessionEvent>,
}

impl SessionWorker {
    fn run(mut self) {
        info!("Session worker started for {}", self.binding);
        let commands = self.commands.clone();
        let completions = self.completions.clone();

        loop {
            let tick = match self.session.watchdog_deadline() {
                Some(deadline) => after(deadline.saturating_duration_since(Instant::now())),
                None => never(),
            };

            let running = select! {
                recv(commands) -> command => match command {
                    Ok(command) => self.handle(command),
                    Err(_) => {
                        debug!("All handles for {} dropped", self.binding);
                        self.session.stop();
                        false
                    }
                },
                recv(completions) -> signal => {
                    if let Ok(signal) = signal {
                        self.session.complete(signal.generation, signal.error);
                    }
                    true
                },
                recv(tick) -> _ => {
                    self.session.check_watchdog(Instant::now());
                    true
                },
            };

            self.publish_events();
            if !running {
                break;
            }
        }

        info!("Session worker for {} stopped", self.binding);
    }

    /// Apply one command; returns false when the worker should exit
    fn handle(&mut self, command: SessionCommand) -> bool {
        // A caller that gave up waiting is not an error.
        match command {
            SessionCommand::EnqueueOne(track, reply) => {
                let _ = reply.send(self.session.enqueue_one(track));
            }
            SessionCommand::EnqueueMany(tracks, reply) => {
                let _ = reply.send(self.session.enqueue_many(tracks));
            }
            SessionCommand::Play(tracks, reply) => {
                let _ = reply.send(self.session.play(tracks));
            }
            SessionCommand::EnsurePlaying(reply) => {
                let _ = reply.send(self.session.ensure_playing());
            }
            SessionCommand::Pause(reply) => {
                let _ = reply.send(self.session.pause());
            }
            SessionCommand::Resume(reply) => {
                let _ = reply.send(self.session.resume());
            }
            SessionCommand::Skip(reply) => {
                let _ = reply.send(self.session.skip());
            }
            SessionCommand::Stop(reply) => {
                let _ = reply.send(self.session.stop());
            }
            SessionCommand::StepBack(reply) => {
                let _ = reply.send(self.session.step_back());
            }
            SessionCommand::Snapshot(limit, reply) => {
                let _ = reply.send(self.session.snapshot(limit));
            }
            SessionCommand::Shutdown(reply) => {
                let _ = reply.send(self.session.stop());
                return false;
            }
        }
        true
    }

    fn publish_events(&mut self) {
        for event in self.session.drain_events() {
            match self.events.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    debug!("Event buffer full for {}, dropping {:?}", self.binding, event);
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
