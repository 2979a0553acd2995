//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tread-lightly.toml
//! file. It provides a centralized way to configure the forecast location, the
//! look-ahead and safety margin, and access to the Willy Weather API.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "tread-lightly.toml";

/// Environment variable that overrides `api.key`
pub const KEY_ENV: &str = "WILLY_WEATHER_KEY";

/// Application configuration loaded from tread-lightly.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Forecast location
    pub location: LocationConfig,
    /// Look-ahead and safety settings
    pub forecast: ForecastConfig,
    /// Data provider access
    pub api: ApiConfig,
}

/// Willy Weather location to forecast for
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Willy Weather location id (e.g. 17924 for Bribie Island)
    pub id: u32,
    /// Human-readable name for reference
    pub name: String,
}

/// Forecast window and safety margin
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ForecastConfig {
    /// Number of days fetched
    pub days: u32,
    /// Hours either side of low tide that count as safe
    pub safe_hours: u32,
    /// Minutes per column of the ASCII chart
    pub chart_step_minutes: u32,
}

impl ForecastConfig {
    /// Safety margin either side of low tide.
    pub fn margin(&self) -> Duration {
        Duration::hours(i64::from(self.safe_hours))
    }
}

/// Willy Weather API access and response caching
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API host, without trailing slash
    pub host: String,
    /// API version path segment
    pub version: String,
    /// API key; `WILLY_WEATHER_KEY` takes precedence when set
    #[serde(default)]
    pub key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Response cache lifetime in hours, 0 disables caching
    pub cache_ttl_hours: u64,
    /// Response cache directory, defaults to a folder under the system temp dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl ApiConfig {
    /// The API key from the environment or the file, if either is non-empty.
    pub fn resolved_key(&self) -> Option<String> {
        std::env::var(KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| Some(self.key.clone()).filter(|key| !key.trim().is_empty()))
    }

    /// Where cached responses are written.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("tread-lightly"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig {
                id: 17924,
                name: "Bribie Island".to_string(),
            },
            forecast: ForecastConfig {
                days: 5,
                safe_hours: 3,
                chart_step_minutes: 60,
            },
            api: ApiConfig {
                host: "https://api.willyweather.com.au".to_string(),
                version: "v2".to_string(),
                key: String::new(),
                timeout_secs: 30,
                cache_ttl_hours: 24,
                cache_dir: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from tread-lightly.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        location = %config.location.name,
                        "loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "invalid config file, using defaults (Bribie Island)"
                    );
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(
                    path = %path.display(),
                    "no config file found, using defaults (Bribie Island)"
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        tracing::info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
