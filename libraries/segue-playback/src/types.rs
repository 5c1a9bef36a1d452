//! Core types for playback sequencing

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Title used when the resolver did not provide one
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Largest accepted `track_timeout_secs` (30 days)
pub const MAX_TRACK_TIMEOUT_SECS: u64 = 30 * 24 * 60 * 60;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one `TrackRef` instance
///
/// Two enqueues of the same URL produce two distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(u64);

impl TrackId {
    fn next() -> Self {
        Self(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Immutable descriptor of one playable item
///
/// Created by the resolver layer and then only moved between the pending
/// queue, the current slot and the history. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Identity of this instance (fresh on deserialize)
    #[serde(skip_deserializing, default = "TrackId::next")]
    id: TrackId,

    /// Opaque playable locator
    url: String,

    /// Display title
    title: String,
}

impl TrackRef {
    /// Create a track reference
    ///
    /// A missing title falls back to [`UNKNOWN_TITLE`]. An empty locator is
    /// rejected.
    pub fn new(url: impl Into<String>, title: Option<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(PlaybackError::InvalidTrack("empty url".to_string()));
        }

        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        Ok(Self {
            id: TrackId::next(),
            url,
            title,
        })
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.title, self.url)
    }
}

/// Playback status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No current track, device not producing audio
    Idle,

    /// Current track rendering
    Playing,

    /// Current track loaded, rendering suspended
    Paused,
}

impl PlaybackStatus {
    /// Playing or paused
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Identifier of a device binding (one session per binding)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(String);

impl BindingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BindingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Configuration for a playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum history size (default: 50, 0 disables step-back)
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Pending tracks shown by a snapshot (default: 10)
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Seconds a track may stay in Playing before the watchdog forces an
    /// advance (default: 4 hours, 0 disables)
    #[serde(default = "default_track_timeout_secs")]
    pub track_timeout_secs: u64,
}

impl SessionConfig {
    /// Watchdog budget, `None` when disabled
    pub fn track_timeout(&self) -> Option<Duration> {
        (self.track_timeout_secs > 0).then(|| Duration::from_secs(self.track_timeout_secs))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.display_limit == 0 {
            return Err(PlaybackError::Config(
                "display_limit must be at least 1".to_string(),
            ));
        }
        if self.track_timeout_secs > MAX_TRACK_TIMEOUT_SECS {
            return Err(PlaybackError::Config(format!(
                "track_timeout_secs must be at most {MAX_TRACK_TIMEOUT_SECS} (0 disables)"
            )));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            display_limit: default_display_limit(),
            track_timeout_secs: default_track_timeout_secs(),
        }
    }
}

fn default_history_size() -> usize {
    50
}

fn default_display_limit() -> usize {
    10
}

fn default_track_timeout_secs() -> u64 {
    4 * 60 * 60
}
