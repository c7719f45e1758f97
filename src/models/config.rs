//! Configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Movies library root.
    pub movies_path: PathBuf,
    /// Shows library root.
    pub shows_path: PathBuf,
    /// Directory for the state file.
    pub data_dir: PathBuf,
    /// TMDB configuration.
    pub tmdb: TmdbConfig,
    /// Jellyfin server configuration.
    pub jellyfin: JellyfinConfig,
}

/// TMDB configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// API key.
    pub api_key: Option<String>,
    /// Target locale for titles and overviews.
    pub language: String,
    /// Reference locale used when the target locale fails the script check.
    pub fallback_language: String,
}

/// Jellyfin server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JellyfinConfig {
    /// Server base URL.
    pub url: String,
    /// API key; rescans are skipped when empty.
    pub api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movies_path: PathBuf::from("/media/movies"),
            shows_path: PathBuf::from("/media/shows"),
            data_dir: dirs_data_path(),
            tmdb: TmdbConfig::default(),
            jellyfin: JellyfinConfig::default(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TMDB_API_KEY").ok(),
            language: "ro-RO".to_string(),
            fallback_language: "en-US".to_string(),
        }
    }
}

impl Default for JellyfinConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("JELLYFIN_URL").unwrap_or_default(),
            api_key: std::env::var("JELLYFIN_API_KEY").unwrap_or_default(),
        }
    }
}

impl Config {
    /// Path of the persistent state file.
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

/// Get the data directory path.
fn dirs_data_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jellyfin_helper")
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jellyfin_helper")
}

/// Load configuration from file, falling back to env-based defaults.
pub fn load_config() -> Config {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str(&content) {
                return config;
            }
            tracing::warn!("Invalid config file, using defaults: {}", config_path.display());
        }
    }

    Config::default()
}
