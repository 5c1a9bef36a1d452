//! Property-based tests for the playback session
//!
//! Random command sequences interleaved with device completions, checking
//! the session's structural invariants after every step.

use crossbeam_channel::Receiver;
use proptest::prelude::*;
use segue_playback::{
    Completion, CompletionRelay, CompletionSignal, PlaybackDevice, PlaybackSession, QueueStore,
    SessionConfig, TrackRef,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ===== Helpers =====

#[derive(Default)]
struct Loopback {
    starts: usize,
    playing: Option<Completion>,
    ended: Vec<Completion>,
}

/// Device whose tracks end when stopped or when the test finishes them
#[derive(Clone, Default)]
struct LoopbackDevice {
    state: Arc<Mutex<Loopback>>,
}

impl LoopbackDevice {
    fn end_current(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(completion) = state.playing.take() {
            completion.notify(None);
            state.ended.push(completion);
        }
    }

    /// Re-send the last completion, as a flaky backend might
    fn repeat_last(&self) {
        if let Some(completion) = self.state.lock().unwrap().ended.last() {
            completion.notify(None);
        }
    }

    fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }
}

impl PlaybackDevice for LoopbackDevice {
    fn start(&mut self, _track: &TrackRef, completion: Completion) {
        let mut state = self.state.lock().unwrap();
        state.starts += 1;
        state.playing = Some(completion);
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn stop(&mut self) {
        self.end_current();
    }
}

#[derive(Debug, Clone)]
enum Op {
    Enqueue(usize),
    Play(usize),
    EnsurePlaying,
    Pause,
    Resume,
    Skip,
    Stop,
    StepBack,
    Finish,
    RepeatCompletion,
    Deliver,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..4).prop_map(Op::Enqueue),
        (0usize..4).prop_map(Op::Play),
        Just(Op::EnsurePlaying),
        Just(Op::Pause),
        Just(Op::Resume),
        Just(Op::Skip),
        Just(Op::Stop),
        Just(Op::StepBack),
        Just(Op::Finish),
        Just(Op::RepeatCompletion),
        Just(Op::Deliver),
    ]
}

fn make_tracks(count: usize, next: &mut usize) -> Vec<TrackRef> {
    (0..count)
        .map(|_| {
            *next += 1;
            TrackRef::new(format!("https://music.test/{next}"), Some(format!("T{next}"))).unwrap()
        })
        .collect()
}

/// Apply every completion the device has posted; returns how many took
fn deliver(session: &mut PlaybackSession, rx: &Receiver<CompletionSignal>) -> usize {
    let mut applied = 0;
    while let Ok(signal) = rx.try_recv() {
        if session.complete(signal.generation, signal.error) {
            applied += 1;
        }
    }
    applied
}

fn check_invariants(session: &PlaybackSession, history_size: usize) -> Result<(), TestCaseError> {
    prop_assert_eq!(
        session.status().is_active(),
        session.current().is_some(),
        "status {:?} with current {:?}",
        session.status(),
        session.current()
    );

    let mut seen = HashSet::new();
    let queue = session.queue();
    for track in queue.pending().chain(session.current()).chain(queue.history()) {
        prop_assert!(seen.insert(track.id()), "{} appears twice", track);
    }

    prop_assert!(queue.history_len() <= history_size);
    Ok(())
}

// ===== Property Tests =====

proptest! {
    /// Property: both session invariants hold after every step
    #[test]
    fn invariants_hold_under_random_commands(
        history_size in 0usize..6,
        ops in prop::collection::vec(arbitrary_op(), 1..80)
    ) {
        let config = SessionConfig { history_size, ..Default::default() };
        let device = LoopbackDevice::default();
        let (relay, rx) = CompletionRelay::channel();
        let mut session = PlaybackSession::new(&config, Box::new(device.clone()), relay);
        let mut next_track = 0;

        for op in ops {
            match op {
                Op::Enqueue(n) => { session.enqueue_many(make_tracks(n, &mut next_track)); }
                Op::Play(n) => { session.play(make_tracks(n, &mut next_track)); }
                Op::EnsurePlaying => { session.ensure_playing(); }
                Op::Pause => { session.pause(); }
                Op::Resume => { session.resume(); }
                Op::Skip => { session.skip(); }
                Op::Stop => { session.stop(); }
                Op::StepBack => { session.step_back().ok(); }
                Op::Finish => device.end_current(),
                Op::RepeatCompletion => device.repeat_last(),
                Op::Deliver => { deliver(&mut session, &rx); }
            }
            check_invariants(&session, history_size)?;
        }

        deliver(&mut session, &rx);
        check_invariants(&session, history_size)?;
    }

    /// Property: never more advances than device starts
    #[test]
    fn completions_apply_at_most_once_per_start(
        ops in prop::collection::vec(arbitrary_op(), 1..80)
    ) {
        let device = LoopbackDevice::default();
        let (relay, rx) = CompletionRelay::channel();
        let mut session =
            PlaybackSession::new(&SessionConfig::default(), Box::new(device.clone()), relay);
        let mut next_track = 0;
        let mut applied = 0;

        for op in ops {
            match op {
                Op::Enqueue(n) | Op::Play(n) => { session.play(make_tracks(n, &mut next_track)); }
                Op::Skip => { session.skip(); }
                Op::Stop => { session.stop(); }
                Op::StepBack => { session.step_back().ok(); }
                Op::Finish => device.end_current(),
                _ => device.repeat_last(),
            }
            applied += deliver(&mut session, &rx);
            prop_assert!(
                applied <= device.starts(),
                "{} advances for {} starts",
                applied,
                device.starts()
            );
        }
    }

    /// Property: a snapshot never hides the true pending count
    #[test]
    fn snapshot_reports_true_total(count in 0usize..40, limit in 1usize..15) {
        let mut store = QueueStore::new(50);
        let mut next_track = 0;
        store.enqueue_many(make_tracks(count, &mut next_track));

        let preview = store.snapshot(limit);
        prop_assert_eq!(preview.total, count);
        prop_assert_eq!(preview.upcoming.len(), count.min(limit));
        prop_assert_eq!(preview.hidden(), count.saturating_sub(limit));
    }
}
