//! Application configuration management.
//!
//! Player preferences live in the user's config directory (typically
//! ~/.config/apem/config.toml). A missing file means defaults; every field has
//! a serde default so partial files keep working as new settings appear.

use crate::constants::{CONFIG_DIR_NAME, LOG_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];
const MIN_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_picker_start_dir")]
    pub picker_start_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_skip_seconds() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_picker_start_dir() -> String {
    "~".to_string()
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_file() -> String {
    std::env::temp_dir()
        .join(LOG_FILE_NAME)
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            skip_seconds: default_skip_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            picker_start_dir: default_picker_start_dir(),
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // XDG_CONFIG_HOME wins everywhere, which also keeps tests hermetic
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join(CONFIG_DIR_NAME)
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join(CONFIG_DIR_NAME)
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Updates one setting. The config is left untouched when the new value
    /// does not validate.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let mut updated = self.clone();
        match key {
            "skip_seconds" => {
                updated.skip_seconds = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a whole number of seconds")?;
            }
            "poll_interval_ms" => {
                updated.poll_interval_ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
            }
            "picker_start_dir" => updated.picker_start_dir = value.to_string(),
            "log_level" => updated.log_level = value.to_lowercase(),
            "log_file" => updated.log_file = value.to_string(),
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.skip_seconds == 0 {
            return Err("skip_seconds must be at least 1".into());
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(format!("poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}").into());
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Unknown log level '{}', expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )
            .into());
        }
        Ok(())
    }

    pub fn skip_interval_ms(&self) -> u64 {
        self.skip_seconds * 1000
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Picker start directory with `~` and environment variables expanded.
    pub fn picker_start_path(&self) -> PathBuf {
        match shellexpand::full(&self.picker_start_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.picker_start_dir).as_ref()),
        }
    }
}
