//! Widget configuration
//!
//! TOML-based, every field optional. A missing or partial file falls back to
//! the defaults that match the stock control panel page.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// System-wide configuration directory
pub const CONFIG_DIR: &str = "/etc/batmon";

/// File name used in both the user and system configuration directories
pub const CONFIG_FILE: &str = "widget.toml";

/// Identifiers of the display targets the widget writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetIds {
    /// Navigation entry whose visibility is kept on
    pub nav_item: String,
    /// Glanceable integer percentage
    pub text: String,
    /// Status indicator whose class list is replaced
    pub led: String,
    pub percent: String,
    pub voltage: String,
    pub status: String,
    pub rate: String,
    pub eta: String,
}

impl TargetIds {
    /// All identifiers, nav entry first
    pub fn ids(&self) -> [&str; 8] {
        [
            self.nav_item.as_str(),
            self.text.as_str(),
            self.led.as_str(),
            self.percent.as_str(),
            self.voltage.as_str(),
            self.status.as_str(),
            self.rate.as_str(),
            self.eta.as_str(),
        ]
    }
}

impl Default for TargetIds {
    fn default() -> Self {
        Self {
            nav_item: "battery-nav-item".to_string(),
            text: "battery-text".to_string(),
            led: "battery-led".to_string(),
            percent: "battery-percent-value".to_string(),
            voltage: "battery-voltage-value".to_string(),
            status: "battery-status-value".to_string(),
            rate: "battery-rate-value".to_string(),
            eta: "battery-eta-value".to_string(),
        }
    }
}

/// Battery widget configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Status endpoint polled with `GET`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Transport timeout for a single request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub targets: TargetIds,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:5000/api/battery".to_string()
}

/// Poll interval used when none is configured
pub(crate) const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            targets: TargetIds::default(),
        }
    }
}

impl WidgetConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try user config first, then system config
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            return Self::load(&user_config);
        }

        let system_config = Path::new(CONFIG_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No widget configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Widget configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the poller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `$XDG_CONFIG_HOME/batmon/widget.toml`, falling back to `~/.config`
fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("batmon").join(CONFIG_FILE))
}
