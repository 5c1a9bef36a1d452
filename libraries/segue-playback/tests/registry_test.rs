//! Session registry tests
//!
//! One session per binding, independent of every other binding.

use segue_playback::{
    BindingId, Completion, Outcome, PlaybackDevice, PlaybackError, PlaybackStatus, SessionConfig,
    SessionRegistry, TrackRef,
};
use std::sync::{Arc, Mutex};

// ===== Test Helpers =====

/// Device that ends a track only when stopped
#[derive(Clone, Default)]
struct StopOnlyDevice {
    playing: Arc<Mutex<Option<Completion>>>,
    started: Arc<Mutex<Vec<String>>>,
}

impl PlaybackDevice for StopOnlyDevice {
    fn start(&mut self, track: &TrackRef, completion: Completion) {
        self.started.lock().unwrap().push(track.title().to_string());
        *self.playing.lock().unwrap() = Some(completion);
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn stop(&mut self) {
        if let Some(completion) = self.playing.lock().unwrap().take() {
            completion.notify(None);
        }
    }
}

fn create_test_track(title: &str) -> TrackRef {
    TrackRef::new(format!("https://music.test/{title}"), Some(title.to_string())).unwrap()
}

fn registry() -> SessionRegistry {
    SessionRegistry::new(SessionConfig::default()).unwrap()
}

// ===== Tests =====

#[test]
fn unknown_binding_is_unavailable() {
    let registry = registry();
    assert_eq!(
        registry.get(&BindingId::new("nowhere")).unwrap_err(),
        PlaybackError::DeviceUnavailable
    );
    assert_eq!(
        registry.leave(&BindingId::new("nowhere")),
        Err(PlaybackError::DeviceUnavailable)
    );
}

#[test]
fn join_then_get_shares_session() {
    let registry = registry();
    let joined = registry
        .join("guild-1", Box::new(StopOnlyDevice::default()))
        .unwrap();

    joined.enqueue_one(create_test_track("A")).unwrap();

    let looked_up = registry.get(&BindingId::new("guild-1")).unwrap();
    assert_eq!(looked_up.snapshot(None).unwrap().pending.total, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn joining_twice_keeps_first_device() {
    let registry = registry();
    let first = StopOnlyDevice::default();
    let second = StopOnlyDevice::default();

    registry.join("guild-1", Box::new(first.clone())).unwrap();
    let handle = registry.join("guild-1", Box::new(second.clone())).unwrap();
    handle.play(vec![create_test_track("A")]).unwrap();

    assert_eq!(*first.started.lock().unwrap(), ["A"]);
    assert!(second.started.lock().unwrap().is_empty());
    assert_eq!(registry.len(), 1);
}

#[test]
fn bindings_are_isolated() {
    let registry = registry();
    let one = registry
        .join("guild-1", Box::new(StopOnlyDevice::default()))
        .unwrap();
    let two = registry
        .join("guild-2", Box::new(StopOnlyDevice::default()))
        .unwrap();

    one.play(vec![create_test_track("A"), create_test_track("B")])
        .unwrap();
    one.pause().unwrap();

    let other = two.snapshot(None).unwrap();
    assert_eq!(other.status, PlaybackStatus::Idle);
    assert_eq!(other.total(), 0);
    assert_eq!(two.skip().unwrap(), Outcome::NothingToDo);

    assert_eq!(one.snapshot(None).unwrap().status, PlaybackStatus::Paused);
    assert_eq!(
        registry.bindings(),
        [BindingId::new("guild-1"), BindingId::new("guild-2")]
    );
}

#[test]
fn leave_tears_down_session() {
    let registry = registry();
    let binding = BindingId::new("guild-1");
    let handle = registry
        .join(binding.clone(), Box::new(StopOnlyDevice::default()))
        .unwrap();
    handle
        .play(vec![create_test_track("A"), create_test_track("B")])
        .unwrap();

    let outcome = registry.leave(&binding).unwrap();
    assert_eq!(
        outcome,
        Outcome::Stopped {
            interrupted: true,
            cleared: 1
        }
    );

    assert!(registry.is_empty());
    assert_eq!(
        registry.get(&binding).unwrap_err(),
        PlaybackError::DeviceUnavailable
    );
    assert_eq!(handle.skip(), Err(PlaybackError::DeviceUnavailable));
}

#[test]
fn rejoin_after_leave_starts_fresh() {
    let registry = registry();
    let binding = BindingId::new("guild-1");

    let handle = registry
        .join(binding.clone(), Box::new(StopOnlyDevice::default()))
        .unwrap();
    handle.enqueue_one(create_test_track("A")).unwrap();
    registry.leave(&binding).unwrap();

    let handle = registry
        .join(binding, Box::new(StopOnlyDevice::default()))
        .unwrap();
    let snapshot = handle.snapshot(None).unwrap();
    assert_eq!(snapshot.total(), 0);
    assert_eq!(snapshot.history_len, 0);
}

#[test]
fn invalid_config_rejected() {
    let config = SessionConfig {
        display_limit: 0,
        ..Default::default()
    };
    assert!(matches!(
        SessionRegistry::new(config),
        Err(PlaybackError::Config(_))
    ));
}
