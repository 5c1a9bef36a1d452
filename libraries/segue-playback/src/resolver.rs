//! Resolver contract
//!
//! Turns free-form user input (a link or a search phrase) into playable
//! tracks. Resolution may hit the network or the disk, so it runs on the
//! caller's thread, never on a session worker.

use crate::error::{PlaybackError, Result};
use crate::types::TrackRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Title reported for playlists the resolver could not name
pub const UNNAMED_PLAYLIST: &str = "Unnamed Playlist";

/// One raw entry as returned by a resolver backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    /// Playable locator; entries without one are unplayable
    pub url: Option<String>,
    pub title: Option<String>,
}

impl ResolvedEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
        }
    }

    fn into_track(self) -> Option<TrackRef> {
        let url = self.url?;
        TrackRef::new(url, self.title).ok()
    }
}

/// What a resolver found for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Direct link to one item
    Single(ResolvedEntry),

    /// Ranked search hits, best first
    SearchResults(Vec<ResolvedEntry>),

    /// A named collection
    Playlist {
        title: Option<String>,
        entries: Vec<ResolvedEntry>,
    },
}

/// Tracks ready to enqueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTracks {
    /// Set when the query named a playlist
    pub playlist_title: Option<String>,

    /// Playable tracks in order
    pub tracks: Vec<TrackRef>,

    /// Playlist entries dropped for lacking a url
    pub skipped: usize,
}

impl Resolution {
    /// Classify into playable tracks
    ///
    /// - single: the one item
    /// - search results: only the best hit
    /// - playlist: every entry with a url, in order
    ///
    /// Fails when nothing playable is left.
    pub fn into_tracks(self, query: &str) -> Result<ResolvedTracks> {
        let resolved = match self {
            Self::Single(entry) => ResolvedTracks {
                playlist_title: None,
                tracks: entry.into_track().into_iter().collect(),
                skipped: 0,
            },
            Self::SearchResults(results) => ResolvedTracks {
                playlist_title: None,
                tracks: results
                    .into_iter()
                    .next()
                    .and_then(ResolvedEntry::into_track)
                    .into_iter()
                    .collect(),
                skipped: 0,
            },
            Self::Playlist { title, entries } => {
                let offered = entries.len();
                let tracks: Vec<TrackRef> =
                    entries.into_iter().filter_map(ResolvedEntry::into_track).collect();
                ResolvedTracks {
                    playlist_title: Some(
                        title
                            .filter(|t| !t.trim().is_empty())
                            .unwrap_or_else(|| UNNAMED_PLAYLIST.to_string()),
                    ),
                    skipped: offered - tracks.len(),
                    tracks,
                }
            }
        };

        if resolved.tracks.is_empty() {
            return Err(PlaybackError::resolution(query, "no results"));
        }
        Ok(resolved)
    }
}

/// Source of tracks for user queries
pub trait Resolver: Send + Sync {
    /// Look `query` up
    fn resolve(&self, query: &str) -> Result<Resolution>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Result<Resolution> + Send + Sync,
{
    fn resolve(&self, query: &str) -> Result<Resolution> {
        self(query)
    }
}

/// Resolve and classify `query`
pub fn resolve_tracks(resolver: &dyn Resolver, query: &str) -> Result<ResolvedTracks> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PlaybackError::resolution(query, "empty query"));
    }

    let resolved = resolver.resolve(query)?.into_tracks(query)?;
    debug!(
        "Resolved '{}' to {} tracks ({} skipped)",
        query,
        resolved.tracks.len(),
        resolved.skipped
    );
    Ok(resolved)
}
