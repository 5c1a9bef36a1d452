//! Simulated playback device
//!
//! Stands in for an audio backend. Each track "plays" for a fixed length on
//! the device's own timer thread, which is also where completions fire from.
//!
//! ```text
//! Session worker               Device thread
//!      │   DeviceCommand::Start       │
//!      │─────────────────────────────>│ timer armed
//!      │                              │ ... track_length ...
//!      │<─────────────────────────────│ completion.notify(None)
//! ```

use crossbeam_channel::{after, never, select, unbounded, Receiver, SendError, Sender};
use segue_playback::{Completion, DeviceError, PlaybackDevice, TrackRef};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

enum DeviceCommand {
    Start {
        track: TrackRef,
        completion: Completion,
    },
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    /// Ends at the given instant
    Running(Instant),

    /// Time left when paused
    Paused(Duration),
}

struct Playing {
    track: TrackRef,
    completion: Completion,
    clock: Clock,
}

/// Timer-driven device; dropping it ends the device thread
pub struct SimulatedDevice {
    commands: Sender<DeviceCommand>,
}

impl SimulatedDevice {
    pub fn spawn(name: &str, track_length: Duration) -> std::io::Result<Self> {
        let (tx, rx) = unbounded();

        thread::Builder::new()
            .name(format!("segue-device-{name}"))
            .spawn(move || run(&rx, track_length))?;

        Ok(Self { commands: tx })
    }

    fn send(&self, command: DeviceCommand) {
        if let Err(SendError(command)) = self.commands.send(command) {
            warn!("Device thread is gone");
            if let DeviceCommand::Start { completion, .. } = command {
                completion.notify(Some(DeviceError::new("device thread stopped")));
            }
        }
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn start(&mut self, track: &TrackRef, completion: Completion) {
        self.send(DeviceCommand::Start {
            track: track.clone(),
            completion,
        });
    }

    fn pause(&mut self) {
        self.send(DeviceCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(DeviceCommand::Resume);
    }

    fn stop(&mut self) {
        self.send(DeviceCommand::Stop);
    }
}

fn run(commands: &Receiver<DeviceCommand>, track_length: Duration) {
    let mut playing: Option<Playing> = None;

    loop {
        let timer = match playing.as_ref().map(|p| p.clock) {
            Some(Clock::Running(ends_at)) => {
                after(ends_at.saturating_duration_since(Instant::now()))
            }
            _ => never(),
        };

        let running = select! {
            recv(commands) -> command => match command {
                Ok(command) => {
                    handle(command, &mut playing, track_length);
                    true
                }
                Err(_) => false,
            },
            recv(timer) -> _ => {
                if let Some(current) = playing.take() {
                    debug!("Finished {}", current.track);
                    current.completion.notify(None);
                }
                true
            },
        };

        if !running {
            // Device dropped
            if let Some(current) = playing.take() {
                current.completion.notify(None);
            }
            break;
        }
    }
}

fn handle(command: DeviceCommand, playing: &mut Option<Playing>, track_length: Duration) {
    let now = Instant::now();

    match command {
        DeviceCommand::Start { track, completion } => {
            if let Some(previous) = playing.take() {
                previous.completion.notify(None);
            }

            if let Some(reason) = unplayable(&track) {
                completion.notify(Some(DeviceError::new(reason)));
                return;
            }

            debug!("Rendering {} for {:?}", track, track_length);
            *playing = Some(Playing {
                track,
                completion,
                clock: Clock::Running(now + track_length),
            });
        }
        DeviceCommand::Pause => {
            if let Some(current) = playing.as_mut() {
                if let Clock::Running(ends_at) = current.clock {
                    current.clock = Clock::Paused(ends_at.saturating_duration_since(now));
                }
            }
        }
        DeviceCommand::Resume => {
            if let Some(current) = playing.as_mut() {
                if let Clock::Paused(left) = current.clock {
                    current.clock = Clock::Running(now + left);
                }
            }
        }
        DeviceCommand::Stop => {
            if let Some(current) = playing.take() {
                debug!("Stopped {}", current.track);
                current.completion.notify(None);
            }
        }
    }
}

/// Local files must still exist when their turn comes
fn unplayable(track: &TrackRef) -> Option<&'static str> {
    let path = track.url().strip_prefix("file://")?;
    (!Path::new(path).is_file()).then_some("file not found")
}
