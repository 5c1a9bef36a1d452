/// CLI configuration
use segue_playback::{PlaybackError, Result, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "segue.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: SessionConfig,

    /// How long the simulated device "plays" each track
    #[serde(default = "default_simulated_track_secs")]
    pub simulated_track_secs: u64,

    /// Binding joined at startup
    #[serde(default = "default_binding")]
    pub binding: String,

    /// Directory searched for plain-text queries
    #[serde(default)]
    pub library_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default `segue.toml` is optional.
    /// Environment variables use the `SEGUE_` prefix with `__` between
    /// nested keys, e.g. `SEGUE_PLAYBACK__HISTORY_SIZE=100`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SEGUE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;

        if self.simulated_track_secs == 0 {
            return Err(PlaybackError::Config(
                "simulated_track_secs must be at least 1".to_string(),
            ));
        }

        if self.binding.trim().is_empty() {
            return Err(PlaybackError::Config("binding must not be empty".to_string()));
        }

        if let Some(dir) = &self.library_dir {
            if !dir.is_dir() {
                return Err(PlaybackError::Config(format!(
                    "library_dir {:?} is not a directory",
                    dir
                )));
            }
        }

        Ok(())
    }

    pub fn simulated_track(&self) -> Duration {
        Duration::from_secs(self.simulated_track_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playback: SessionConfig::default(),
            simulated_track_secs: default_simulated_track_secs(),
            binding: default_binding(),
            library_dir: None,
        }
    }
}

// Default values
fn default_simulated_track_secs() -> u64 {
    5
}

fn default_binding() -> String {
    "local".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulated_track(), Duration::from_secs(5));
        assert_eq!(config.playback.history_size, 50);
    }

    #[test]
    fn load_from_file_with_partial_playback_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "binding = \"guild-42\"\nsimulated_track_secs = 2\n\n[playback]\nhistory_size = 5"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.binding, "guild-42");
        assert_eq!(config.simulated_track_secs, 2);
        assert_eq!(config.playback.history_size, 5);
        assert_eq!(config.playback.display_limit, 10);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }

    #[test]
    fn zero_track_length_rejected() {
        let config = AppConfig {
            simulated_track_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));
    }
}
