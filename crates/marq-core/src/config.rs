//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/marq/config.toml)
//! 3. Environment variables (MARQ_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::feed::FeedConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "MARQ";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the store's HTTP API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// WebSocket URL of the change feed
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Session token (optional; unauthenticated calls fail with an auth error)
    #[serde(default)]
    pub token: Option<String>,

    /// Bounded timeout applied to every store request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// First reconnect delay after the feed drops, in seconds
    #[serde(default = "default_initial_reconnect_delay_secs")]
    pub initial_reconnect_delay_secs: u64,

    /// Ceiling for the doubling reconnect delay, in seconds
    #[serde(default = "default_max_reconnect_delay_secs")]
    pub max_reconnect_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            feed_url: default_feed_url(),
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
            initial_reconnect_delay_secs: default_initial_reconnect_delay_secs(),
            max_reconnect_delay_secs: default_max_reconnect_delay_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MARQ_API_URL, MARQ_FEED_URL, MARQ_TOKEN,
    ///    MARQ_REQUEST_TIMEOUT_SECS)
    /// 2. Config file (~/.config/marq/config.toml or MARQ_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_API_URL", ENV_PREFIX)) {
            self.api_url = val;
        }

        if let Ok(val) = std::env::var(format!("{}_FEED_URL", ENV_PREFIX)) {
            self.feed_url = val;
        }

        if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
            self.token = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_REQUEST_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MARQ_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marq")
            .join("config.toml")
    }

    /// Build the feed subscription configuration
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            url: self.feed_url.clone(),
            token: self.token.clone(),
            initial_reconnect_delay: std::time::Duration::from_secs(
                self.initial_reconnect_delay_secs,
            ),
            max_reconnect_delay: std::time::Duration::from_secs(self.max_reconnect_delay_secs),
            ..FeedConfig::default()
        }
    }
}

fn default_api_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_feed_url() -> String {
    "ws://127.0.0.1:8080/feed".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_initial_reconnect_delay_secs() -> u64 {
    1
}

fn default_max_reconnect_delay_secs() -> u64 {
    30
}
