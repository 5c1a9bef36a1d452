//! Text rendering of outcomes, events and queue listings

use segue_playback::{Outcome, PlayReport, PlaybackError, QueueSnapshot, SessionEvent};
use std::fmt::Write;

pub fn outcome(outcome: &Outcome) -> String {
    match outcome {
        // "Now playing" arrives as a session event
        Outcome::Enqueued { added: 1, .. } => "Added 1 song to the queue.".to_string(),
        Outcome::Enqueued { added, .. } => format!("Added {added} songs to the queue."),
        Outcome::NowPlaying(track) => format!("Now playing: {}", track.title()),
        Outcome::AlreadyPlaying => "Already playing.".to_string(),
        Outcome::QueueEmpty => "The queue is empty.".to_string(),
        Outcome::Paused => "Paused.".to_string(),
        Outcome::Resumed => "Resuming.".to_string(),
        Outcome::NothingToDo => "Nothing to do.".to_string(),
        Outcome::Skipping { next: Some(_) } => "Skipped to the next song.".to_string(),
        Outcome::Skipping { next: None } => {
            "This is the last song. Stopping playback.".to_string()
        }
        Outcome::Stopped {
            interrupted: true, ..
        } => "Stopped playback and cleared the queue.".to_string(),
        Outcome::Stopped { .. } => "Queue cleared.".to_string(),
        Outcome::SteppingBack(track) => format!("Going back to: {}", track.title()),
    }
}

/// Reply to a `play` command
pub fn play_report(report: &PlayReport) -> String {
    let mut out = String::new();
    if let Some(title) = &report.playlist_title {
        let _ = writeln!(out, "Adding playlist {title} to the queue...");
        if report.skipped > 0 {
            let _ = writeln!(out, "Skipped {} unplayable entries.", report.skipped);
        }
    }
    out.push_str(&outcome(&report.outcome));
    out
}

pub fn event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::NowPlaying(track) => Some(format!("Now playing: {}", track.title())),
        SessionEvent::QueueEmpty => Some("The queue is now empty.".to_string()),
        SessionEvent::TrackFailed { track, reason } => Some(match track {
            Some(track) => format!("Could not play {}: {reason}", track.title()),
            None => format!("Playback error: {reason}"),
        }),
        SessionEvent::StatusChanged(_) | SessionEvent::QueueChanged { .. } => None,
    }
}

pub fn error(error: &PlaybackError) -> String {
    match error {
        PlaybackError::NoHistory => "There is no song history to go back to.".to_string(),
        PlaybackError::DeviceUnavailable => "Not connected. Use `join` first.".to_string(),
        PlaybackError::Resolution { .. } => {
            format!("Could not find anything to play. {error}")
        }
        other => other.to_string(),
    }
}

/// Queue listing: now playing, capped up-next list, total footer
pub fn queue(snapshot: &QueueSnapshot) -> String {
    let mut out = String::from("Now Playing\n");
    match &snapshot.current {
        Some(track) => {
            let _ = writeln!(out, "  {} <{}>", track.title(), track.url());
        }
        None => out.push_str("  Nothing is currently playing.\n"),
    }

    out.push_str("Up Next\n");
    if snapshot.pending.upcoming.is_empty() {
        out.push_str("  The queue is empty!\n");
    } else {
        for (i, track) in snapshot.pending.upcoming.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, track.title());
        }
        if snapshot.pending.hidden() > 0 {
            let _ = writeln!(out, "  ...and {} more.", snapshot.pending.hidden());
        }
    }

    let _ = write!(out, "Total songs in queue: {}", snapshot.total());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use segue_playback::{PendingPreview, PlaybackStatus, TrackRef};

    fn create_test_track(title: &str) -> TrackRef {
        TrackRef::new(format!("https://music.test/{title}"), Some(title.to_string())).unwrap()
    }

    #[test]
    fn queue_listing_caps_and_counts() {
        let upcoming: Vec<TrackRef> = (1..=3)
            .map(|i| create_test_track(&format!("T{i}")))
            .collect();
        let snapshot = QueueSnapshot {
            status: PlaybackStatus::Playing,
            current: Some(create_test_track("Now")),
            pending: PendingPreview { upcoming, total: 5 },
            history_len: 0,
        };

        let text = queue(&snapshot);
        assert!(text.contains("Now <https://music.test/Now>"));
        assert!(text.contains("  3. T3"));
        assert!(text.contains("...and 2 more."));
        assert!(text.ends_with("Total songs in queue: 6"));
    }

    #[test]
    fn empty_queue_listing() {
        let snapshot = QueueSnapshot {
            status: PlaybackStatus::Idle,
            current: None,
            pending: PendingPreview {
                upcoming: Vec::new(),
                total: 0,
            },
            history_len: 3,
        };

        let text = queue(&snapshot);
        assert!(text.contains("Nothing is currently playing."));
        assert!(text.contains("The queue is empty!"));
        assert!(text.ends_with("Total songs in queue: 0"));
    }

    #[test]
    fn skip_and_stop_wording() {
        assert_eq!(
            outcome(&Outcome::Skipping { next: None }),
            "This is the last song. Stopping playback."
        );
        assert_eq!(
            outcome(&Outcome::Stopped {
                interrupted: false,
                cleared: 4
            }),
            "Queue cleared."
        );
    }

    #[test]
    fn single_enqueue_while_playing() {
        let text = outcome(&Outcome::Enqueued {
            added: 1,
            pending: 3,
            now_playing: None,
        });
        assert_eq!(text, "Added 1 song to the queue.");
    }
}
