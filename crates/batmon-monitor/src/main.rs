//! batmon monitor daemon
//!
//! Samples the configured fuel gauge in the background and serves the
//! smoothed readings on `GET /api/battery`.

use anyhow::{Context, Result};
use batmon_monitor::{
    FuelGauge, GaugeConfig, Max17048, MonitorConfig, RateTracker, Sampler, SysfsGauge, api,
};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let config = load_config()?;
    info!("batmon monitor starting (gauge: {:?})", config.gauge);

    let tracker = RateTracker::shared(config.smooth_window, config.min_delta);

    let gauge = open_gauge(&config.gauge)?;
    let mut sampler = Sampler::new(gauge, tracker.clone(), config.sample_interval());
    sampler.start();

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Serving battery status on http://{}/api/battery", config.bind);

    axum::serve(listener, api::router(tracker))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sampler.stop();
    info!("batmon monitor exiting");
    Ok(())
}

/// Setup logging to console
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(false))
        .init();
}

/// Config path from the first argument, else the default location
fn load_config() -> Result<MonitorConfig> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => MonitorConfig::load(&path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => MonitorConfig::load_default().context("Failed to load monitor configuration"),
    }
}

fn open_gauge(config: &GaugeConfig) -> Result<Box<dyn FuelGauge>> {
    let gauge: Box<dyn FuelGauge> = match config {
        GaugeConfig::Max17048 { bus, address } => Box::new(
            Max17048::open(*bus, *address).context("Failed to open MAX17048 gauge")?,
        ),
        GaugeConfig::Sysfs { path: Some(path) } => Box::new(SysfsGauge::new(path.clone())),
        GaugeConfig::Sysfs { path: None } => {
            Box::new(SysfsGauge::detect().context("No sysfs battery found")?)
        }
    };
    Ok(gauge)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
