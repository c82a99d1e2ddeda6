//! Charge rate smoothing and time-remaining estimation

use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Placeholder reported until the smoothing window has filled
pub const CALCULATING: &str = "still calculating";

/// Tracker shared between the sampler thread and the HTTP handlers
pub type SharedTracker = Arc<RwLock<RateTracker>>;

/// Charge direction derived from the smoothed rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Charging,
    Discharging,
    #[default]
    Idle,
}

/// A derived value that may not be computable yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Calculating,
    Value(f64),
}

impl Serialize for Estimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Estimate::Calculating => serializer.serialize_str(CALCULATING),
            Estimate::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

/// JSON body of `GET /api/battery`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryReport {
    pub available: bool,
    pub voltage: f64,
    pub percent: f64,
    pub status: Direction,
    pub rate_per_hour: Estimate,
    pub eta_hours: Option<Estimate>,
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    percent: f64,
    at: Instant,
}

/// Accumulates gauge samples into a smoothed rate
#[derive(Debug)]
pub struct RateTracker {
    history: VecDeque<f64>,
    window: usize,
    min_delta: f64,
    baseline: Option<Baseline>,
    percent: Option<f64>,
    voltage: Option<f64>,
    direction: Direction,
}

impl RateTracker {
    pub fn new(window: usize, min_delta: f64) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
            min_delta,
            baseline: None,
            percent: None,
            voltage: None,
            direction: Direction::Idle,
        }
    }

    pub fn shared(window: usize, min_delta: f64) -> SharedTracker {
        Arc::new(RwLock::new(Self::new(window, min_delta)))
    }

    /// Record a sample taken at `at`
    ///
    /// The baseline only advances when a rate is recorded, so a slow drain
    /// below `min_delta` per sample still shows up once it accumulates.
    pub fn record(&mut self, percent: f64, voltage: f64, at: Instant) {
        self.percent = Some(percent);
        self.voltage = Some(voltage);

        let Some(baseline) = self.baseline else {
            self.baseline = Some(Baseline { percent, at });
            return;
        };

        let delta_percent = percent - baseline.percent;
        let delta_hours = at.saturating_duration_since(baseline.at).as_secs_f64() / 3600.0;

        if delta_percent.abs() >= self.min_delta && delta_hours > 0.0 {
            if self.history.len() == self.window {
                self.history.pop_front();
            }
            self.history.push_back(delta_percent / delta_hours);
            self.baseline = Some(Baseline { percent, at });
        }

        self.direction = match self.average_rate() {
            Some(rate) if rate > 0.0 => Direction::Charging,
            Some(rate) if rate < 0.0 => Direction::Discharging,
            _ => Direction::Idle,
        };
    }

    /// Mean of the recorded rates in %/h
    pub fn average_rate(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f64>() / self.history.len() as f64)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_settled(&self) -> bool {
        self.history.len() >= self.window
    }

    /// Current report, `None` before the first sample
    pub fn report(&self) -> Option<BatteryReport> {
        let (percent, voltage) = (self.percent?, self.voltage?);

        let (rate_per_hour, eta_hours) = match self.average_rate() {
            Some(avg) if self.is_settled() => {
                let rate = avg.abs();
                // A zero estimate (already full or empty) is reported as null
                let eta = estimate_time(rate, percent, self.direction).filter(|h| *h != 0.0);
                (
                    Estimate::Value(round_to(rate, 2)),
                    eta.map(|h| Estimate::Value(round_to(h, 2))),
                )
            }
            _ => (Estimate::Calculating, Some(Estimate::Calculating)),
        };

        Some(BatteryReport {
            available: true,
            voltage: round_to(voltage, 3),
            percent: round_to(percent, 2),
            status: self.direction,
            rate_per_hour,
            eta_hours,
        })
    }
}

/// Hours until empty (discharging) or full (charging) at `rate_per_hour`
pub fn estimate_time(rate_per_hour: f64, percent: f64, direction: Direction) -> Option<f64> {
    if rate_per_hour <= 0.0 {
        return None;
    }
    match direction {
        Direction::Discharging => Some(percent / rate_per_hour),
        Direction::Charging => Some((100.0 - percent) / rate_per_hour),
        Direction::Idle => None,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
