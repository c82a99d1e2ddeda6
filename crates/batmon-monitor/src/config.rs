//! Monitor configuration

use crate::MonitorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System configuration file
pub const CONFIG_PATH: &str = "/etc/batmon/monitor.toml";

/// Which fuel gauge to sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GaugeConfig {
    /// MAX17048 on an i2c bus
    Max17048 {
        #[serde(default = "default_i2c_bus")]
        bus: u8,
        #[serde(default = "default_i2c_address")]
        address: u16,
    },
    /// Kernel power_supply class; auto-detected when `path` is unset
    Sysfs {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_i2c_address() -> u16 {
    0x36
}

impl Default for GaugeConfig {
    fn default() -> Self {
        GaugeConfig::Max17048 {
            bus: default_i2c_bus(),
            address: default_i2c_address(),
        }
    }
}

/// Battery monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Listen address for the HTTP API
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Seconds between gauge samples
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,

    /// Number of rate samples averaged
    #[serde(default = "default_smooth_window")]
    pub smooth_window: usize,

    /// Percent changes smaller than this are not turned into a rate
    #[serde(default = "default_min_delta")]
    pub min_delta: f64,

    #[serde(default)]
    pub gauge: GaugeConfig,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_sample_interval() -> u64 {
    30
}

fn default_smooth_window() -> usize {
    10
}

fn default_min_delta() -> f64 {
    0.05
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            sample_interval_secs: default_sample_interval(),
            smooth_window: default_smooth_window(),
            min_delta: default_min_delta(),
            gauge: GaugeConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the system configuration, or defaults when there is none
    pub fn load_default() -> Result<Self, MonitorError> {
        let path = Path::new(CONFIG_PATH);
        if path.exists() {
            return Self::load(path);
        }

        tracing::warn!("No monitor configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.sample_interval_secs == 0 {
            return Err(MonitorError::Config(
                "sample_interval_secs must be greater than zero".into(),
            ));
        }
        if self.smooth_window == 0 {
            return Err(MonitorError::Config(
                "smooth_window must be greater than zero".into(),
            ));
        }
        if !self.min_delta.is_finite() || self.min_delta < 0.0 {
            return Err(MonitorError::Config(
                "min_delta must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}
