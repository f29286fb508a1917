//! Global configuration parsing, validation, and defaults fallback.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Remote catalog API connectivity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct ApiConfig {
    /// Base URL; `/songs` and `/schedulers` are appended.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_seconds: u64,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Initial delay between retries; doubled after each retry.
    pub retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".into(),
            timeout_seconds: 10,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl ApiConfig {
    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Periods of the two agent ticks.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct IntervalConfig {
    /// Sync-and-launch tick period.
    pub sync_seconds: u64,
    /// Stop-watchdog tick period.
    pub watchdog_seconds: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            sync_seconds: 10,
            watchdog_seconds: 5,
        }
    }
}

impl IntervalConfig {
    /// Sync-and-launch period.
    #[must_use]
    pub fn sync(&self) -> Duration {
        Duration::from_secs(self.sync_seconds)
    }

    /// Watchdog period.
    #[must_use]
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_seconds)
    }
}

/// External player settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct PlayerConfig {
    /// Player executable (`mpv` by default).
    pub path: String,
    /// Playback volume, 0–100.
    pub volume: u8,
    /// Output audio device; an empty string leaves the choice to the player.
    pub audio_device: Option<String>,
    /// Grace period between SIGTERM and a forced kill on cancellation.
    pub stop_grace_seconds: u64,
    /// Additional arguments appended after the fixed option set.
    pub extra_args: Vec<String>,
    /// Extra environment for the player process.
    pub env: HashMap<String, String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            path: "mpv".into(),
            volume: 50,
            audio_device: Some("alsa/default".into()),
            stop_grace_seconds: 5,
            extra_args: Vec::new(),
            env: HashMap::from([
                ("PULSE_LATENCY_MSEC".to_owned(), "30".to_owned()),
                ("PULSE_STREAM_NAME".to_owned(), "Music Player".to_owned()),
            ]),
        }
    }
}

impl PlayerConfig {
    /// Grace period as a [`Duration`].
    #[must_use]
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_seconds)
    }
}

/// Track resolver (`yt-dlp`) settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct ResolverConfig {
    /// Resolver executable handed to the player and used for search.
    pub ytdlp_path: String,
    /// Number of results requested by manual search.
    pub search_results: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".into(),
            search_results: 5,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Global configuration parsed from `config.toml`.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the cached catalog and schedule documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Tick periods.
    #[serde(default)]
    pub intervals: IntervalConfig,
    /// Player settings.
    #[serde(default)]
    pub player: PlayerConfig,
    /// Resolver settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api: ApiConfig::default(),
            intervals: IntervalConfig::default(),
            player: PlayerConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Load configuration, falling back to [`GlobalConfig::default`] on any
    /// failure. The failure is logged so a bad file never goes unnoticed.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_path(path) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(err) => {
                warn!(%err, path = %path.display(), "using default configuration");
                Self::default()
            }
        }
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.intervals.sync_seconds == 0 || self.intervals.watchdog_seconds == 0 {
            return Err(AppError::Config(
                "tick intervals must be greater than zero".into(),
            ));
        }

        if self.api.base_url.trim().is_empty() {
            return Err(AppError::Config("api.base_url must not be empty".into()));
        }

        if self.player.path.trim().is_empty() {
            return Err(AppError::Config("player.path must not be empty".into()));
        }

        if self.resolver.ytdlp_path.trim().is_empty() {
            return Err(AppError::Config(
                "resolver.ytdlp_path must not be empty".into(),
            ));
        }

        if self.player.volume > 100 {
            return Err(AppError::Config(
                "player.volume must be between 0 and 100".into(),
            ));
        }

        Ok(())
    }
}
