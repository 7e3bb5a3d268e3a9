//! Configuration management for Trendcast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub enabled: bool,
    /// Channel `@username` or numeric chat id to post into.
    pub chat: String,
    /// Name of the environment variable holding the bot token. The token
    /// itself never appears in the config file.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Queue owner used when the CLI does not pass `--user`.
    #[serde(default)]
    pub user_id: i64,
    /// Minutes east of UTC for computing the current HH:MM slot.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Days a published fingerprint suppresses duplicates for.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_days: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            user_id: 0,
            utc_offset_minutes: 0,
            dedup_window_days: default_dedup_window(),
        }
    }
}

fn default_token_env() -> String {
    "TRENDCAST_TELEGRAM_TOKEN".to_string()
}

fn default_dedup_window() -> u32 {
    crate::dedup::DEFAULT_WINDOW_DAYS
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/trendcast/plan.db".to_string(),
            },
            telegram: None,
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TRENDCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("trendcast").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("trendcast"))
}
