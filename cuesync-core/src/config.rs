use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CuesyncConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume in percent, 0..=100
    #[serde(default = "default_volume")]
    pub default_volume: i32,
    /// Step for the relative-seek commands, in seconds
    #[serde(default = "default_seek_step")]
    pub seek_step_secs: f64,
}

const fn default_volume() -> i32 {
    100
}

const fn default_seek_step() -> f64 {
    5.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            seek_step_secs: default_seek_step(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Sync loop ticks per second while playing
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

const fn default_frame_rate() -> u32 {
    crate::sync::DEFAULT_FRAME_RATE
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
        }
    }
}

impl CuesyncConfig {
    /// Get the configuration directory path (~/.config/cuesync/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/cuesync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file, writing a template and returning defaults
    /// on first run. Nothing in the config is mandatory, so a missing
    /// file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or
    /// parsed, or if a value is out of range.
    pub fn load_or_init() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;
            info!("Created default config at {}", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.sync.frame_rate == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "sync.frame_rate must be at least 1".to_string(),
            });
        }
        if !self.playback.seek_step_secs.is_finite() || self.playback.seek_step_secs <= 0.0 {
            return Err(CoreError::ConfigInvalid {
                message: "playback.seek_step_secs must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r"# Cuesync Configuration
# ~/.config/cuesync/config.toml

[playback]
# Initial volume in percent (0-100)
default_volume = 100
# Step used by the rewind / fast-forward commands, in seconds
seek_step_secs = 5.0

[sync]
# How many times per second the sync loop samples the media clock
# while playing. Matches a typical display refresh rate.
frame_rate = 60
";
