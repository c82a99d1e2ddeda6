//! Battery monitor service
//!
//! Samples a fuel gauge on a fixed cadence, smooths the charge rate over a
//! window of samples and serves the result as JSON on `GET /api/battery`.
//!
//! # Gauges
//!
//! - MAX17048 over Linux i2c-dev (UPS HATs on Raspberry Pi class boards)
//! - Any kernel `power_supply` battery via sysfs

pub mod api;
mod config;
pub mod gauge;
mod sampler;
mod tracker;

pub use config::{GaugeConfig, MonitorConfig};
pub use gauge::{FuelGauge, Max17048, SysfsGauge};
pub use sampler::Sampler;
pub use tracker::{BatteryReport, Direction, Estimate, RateTracker, SharedTracker};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Gauge not found: {0}")]
    GaugeNotFound(PathBuf),

    #[error("Gauge read failed: {0}")]
    Gauge(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ioctl failed: {0}")]
    Ioctl(#[from] nix::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Monitor Result type
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_error_display() {
        let err = MonitorError::GaugeNotFound(PathBuf::from("/dev/i2c-1"));
        assert!(format!("{}", err).contains("/dev/i2c-1"));

        let err = MonitorError::Gauge("short read".to_string());
        assert!(format!("{}", err).contains("short read"));
    }
}
