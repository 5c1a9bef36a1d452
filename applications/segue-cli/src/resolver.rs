//! Local resolver
//!
//! - `http(s)://...` links resolve to a single track
//! - a local audio file resolves to a single track
//! - a local directory resolves to a playlist of its audio files
//! - anything else is searched by file name in the library directory

use segue_playback::{PlaybackError, Resolution, ResolvedEntry, Resolver, Result};
use std::fs;
use std::path::{Path, PathBuf};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "opus", "m4a"];

pub struct LocalResolver {
    library_dir: Option<PathBuf>,
}

impl LocalResolver {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn search(&self, query: &str) -> Result<Resolution> {
        let Some(dir) = &self.library_dir else {
            return Err(PlaybackError::resolution(
                query,
                "not a link or local path, and no library_dir is configured",
            ));
        };

        let needle = query.to_lowercase();
        let hits = audio_files(dir)
            .map_err(|e| PlaybackError::resolution(query, e.to_string()))?
            .into_iter()
            .filter(|path| {
                file_title(path).is_some_and(|title| title.to_lowercase().contains(&needle))
            })
            .map(|path| entry_for(&path))
            .collect();

        Ok(Resolution::SearchResults(hits))
    }
}

impl Resolver for LocalResolver {
    fn resolve(&self, query: &str) -> Result<Resolution> {
        if query.starts_with("http://") || query.starts_with("https://") {
            let title = query
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty() && !segment.contains(':'))
                .map(str::to_string);
            return Ok(Resolution::Single(ResolvedEntry {
                url: Some(query.to_string()),
                title,
            }));
        }

        let path = Path::new(query);
        if path.is_dir() {
            let files =
                audio_files(path).map_err(|e| PlaybackError::resolution(query, e.to_string()))?;
            return Ok(Resolution::Playlist {
                title: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                entries: files.iter().map(|file| entry_for(file)).collect(),
            });
        }

        if path.is_file() {
            if !is_audio(path) {
                return Err(PlaybackError::resolution(query, "not an audio file"));
            }
            return Ok(Resolution::Single(entry_for(path)));
        }

        self.search(query)
    }
}

/// Audio files directly inside `dir`, sorted by name
fn audio_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_audio(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn file_title(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

fn entry_for(path: &Path) -> ResolvedEntry {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    ResolvedEntry {
        url: Some(format!("file://{}", absolute.display())),
        title: file_title(path),
    }
}
