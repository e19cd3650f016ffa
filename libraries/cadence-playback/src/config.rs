//! Playback controller configuration

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "CADENCE";

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Progress tick cadence in milliseconds (default: 100, i.e. 10 Hz)
    pub tick_interval_ms: u64,

    /// "Back" restarts the current song past this many seconds (default: 5)
    pub restart_threshold_secs: f64,

    /// Clamp seek targets to the song duration (default: true)
    ///
    /// When disabled only negative targets are clamped; a seek past the end
    /// is tolerated until the next tick finishes the song.
    pub clamp_seek: bool,

    /// Fixed seed for shuffle order generation (default: none, use entropy)
    pub shuffle_seed: Option<u64>,

    /// Maximum number of records kept by the in-memory history (default: 500)
    pub history_size: usize,

    /// User the lifecycle events are recorded for (default: 1)
    pub user_id: i64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            restart_threshold_secs: 5.0,
            clamp_seek: true,
            shuffle_seed: None,
            history_size: 500,
            user_id: 1,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables prefixed with `CADENCE_` override file values,
    /// e.g. `CADENCE_TICK_INTERVAL_MS=50`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(PlaybackError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(?config, "Loaded playback configuration");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }

        if !self.restart_threshold_secs.is_finite() || self.restart_threshold_secs < 0.0 {
            return Err(PlaybackError::Config(format!(
                "restart_threshold_secs must be a non-negative number, got {}",
                self.restart_threshold_secs
            )));
        }

        Ok(())
    }

    /// Tick cadence as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
