//! Error types for playback sequencing

use thiserror::Error;

/// Playback errors
///
/// Every variant is recoverable at the command boundary. None of them leave
/// the queue or the session in an inconsistent state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Input could not be turned into playable tracks
    #[error("Could not resolve '{query}': {reason}")]
    Resolution { query: String, reason: String },

    /// Step-back requested with nothing in history
    #[error("No playback history to go back to")]
    NoHistory,

    /// No device binding exists (never joined, or already left)
    #[error("No playback device is bound")]
    DeviceUnavailable,

    /// Track reference rejected at construction
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PlaybackError {
    /// Build a resolution error for `query`
    pub fn resolution(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            query: query.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
