//! Background gauge sampling

use crate::gauge::FuelGauge;
use crate::tracker::SharedTracker;
use crate::MonitorError;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Samples a gauge into a shared tracker on a dedicated thread
pub struct Sampler<G: FuelGauge + 'static> {
    gauge: Option<G>,
    tracker: SharedTracker,
    interval: Duration,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<G: FuelGauge + 'static> Sampler<G> {
    pub fn new(gauge: G, tracker: SharedTracker, interval: Duration) -> Self {
        Self {
            gauge: Some(gauge),
            tracker,
            interval,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Take one sample and record it
    pub fn sample_once(&mut self) -> Result<(), MonitorError> {
        match self.gauge.as_mut() {
            Some(gauge) => sample(gauge, &self.tracker),
            None => Err(MonitorError::Gauge("sampler already running".into())),
        }
    }

    /// Start sampling: first sample immediately, then every interval
    pub fn start(&mut self) {
        let Some(mut gauge) = self.gauge.take() else {
            return;
        };

        let tracker = Arc::clone(&self.tracker);
        let stop = Arc::clone(&self.stop);
        let interval = self.interval;

        self.handle = Some(thread::spawn(move || {
            tracing::info!("Battery sampler started, interval {:?}", interval);

            while !stop.load(Ordering::Relaxed) {
                if let Err(e) = sample(&mut gauge, &tracker) {
                    tracing::warn!(error = %e, "Battery sample failed");
                }

                // Sleep in short slices so stop() is honoured promptly
                let deadline = Instant::now() + interval;
                while !stop.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::sleep((deadline - now).min(Duration::from_millis(100)));
                }
            }

            tracing::info!("Battery sampler stopped");
        }));
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the sampling thread and wait for it
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("Battery sampler thread panicked");
        }
    }
}

impl<G: FuelGauge + 'static> Drop for Sampler<G> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sample<G: FuelGauge>(gauge: &mut G, tracker: &SharedTracker) -> Result<(), MonitorError> {
    let percent = gauge.read_percent()?;
    let voltage = gauge.read_voltage()?;
    tracing::debug!(percent, voltage, "Battery sample");

    tracker
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .record(percent, voltage, Instant::now());
    Ok(())
}
