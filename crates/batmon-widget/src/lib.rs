//! Battery status widget
//!
//! Polls a battery monitor endpoint, normalizes whatever shape the payload
//! arrives in and projects it onto a fixed set of display targets: primary
//! percentage, status indicator LED, and a detail panel with percent,
//! voltage, status, charge rate and estimated time remaining.
//!
//! Display targets are reached through the [`Surface`] trait so the widget
//! can drive any host (a web page bridge, a terminal panel, tests).
//!
//! # Example
//!
//! ```no_run
//! use batmon_widget::{BatteryWidget, MemorySurface, WidgetConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), batmon_widget::WidgetError> {
//!     let config = WidgetConfig::default();
//!     let surface = MemorySurface::with_targets(config.targets.ids());
//!     let mut widget = BatteryWidget::new(&config, surface)?;
//!
//!     widget.start();
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     widget.with_surface(|s| println!("{:?}", s.text(&config.targets.text)));
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod format;
pub mod mock;
mod normalize;
mod render;
mod surface;
mod widget;

pub use client::StatusClient;
pub use config::{ConfigError, TargetIds, WidgetConfig};
pub use format::{
    IndicatorClass, LedColor, LevelTier, UNAVAILABLE, UNAVAILABLE_CLASS, format_eta,
    format_status,
};
pub use mock::{MemoryElement, MemorySurface};
pub use normalize::{NormalizedStatus, Reading, normalize};
pub use render::Renderer;
pub use surface::{Element, Surface};
pub use widget::BatteryWidget;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Status endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed status body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Widget Result type
pub type Result<T> = std::result::Result<T, WidgetError>;
