//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/specter/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/specter/` (~/.config/specter/)
//! - State/Logs: `$XDG_STATE_HOME/specter/` (~/.local/state/specter/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analysis service connection
    #[serde(default)]
    pub service: ServiceConfig,

    /// Overlay canvas dimensions
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis service connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Base URL of the analysis service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Timeout for non-streaming requests (health check) in seconds.
    ///
    /// Never applied to the analysis stream itself: a long-running
    /// analysis must not be cut off by a request deadline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config(
                "service.base_url must not be empty".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "service.base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

/// Overlay canvas settings
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct OverlayConfig {
    /// Canvas width in pixels
    #[serde(default = "default_overlay_width")]
    pub width: u32,

    /// Canvas height in pixels
    #[serde(default = "default_overlay_height")]
    pub height: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: default_overlay_width(),
            height: default_overlay_height(),
        }
    }
}

fn default_overlay_width() -> u32 {
    640
}

fn default_overlay_height() -> u32 {
    480
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.service.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/specter/config.toml` (~/.config/specter/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("specter").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/specter/` (~/.local/state/specter/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("specter")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/specter/specter.log` (~/.local/state/specter/specter.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("specter.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path
    /// behavior before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
