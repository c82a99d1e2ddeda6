//! Display formatting: status labels, ETA text and the indicator LED class

use std::fmt;

/// Placeholder shown when a value cannot be determined
pub const UNAVAILABLE: &str = "N/A";

/// Indicator class applied when no status is known
pub const UNAVAILABLE_CLASS: &str = "led-battery led-gray";

const LED_BASE_CLASS: &str = "led-battery";

/// Map a canonical lower-case status to its display label
pub fn format_status(status: &str) -> &'static str {
    match status {
        "charging" => "Charging",
        "discharging" => "Discharging",
        "idle" => "Idle",
        _ => "Unknown",
    }
}

/// Format a number of hours as `{m}m`, `{h}h {m}m` or `{d}d {h}h`.
///
/// Minutes are rounded half away from zero and never roll over into the
/// next unit, so `0.999` renders as `60m` rather than `1h 0m`.
pub fn format_eta(hours: f64) -> String {
    if !hours.is_finite() || hours < 0.0 {
        return UNAVAILABLE.to_string();
    }

    // `+ 0.0` folds -0 into 0
    let hours = hours + 0.0;

    if hours < 1.0 {
        format!("{:.0}m", (hours * 60.0).round())
    } else if hours < 24.0 {
        let h = hours.floor();
        let m = ((hours - h) * 60.0).round();
        format!("{:.0}h {:.0}m", h, m)
    } else {
        let d = (hours / 24.0).floor();
        let h = (hours % 24.0).round();
        format!("{:.0}d {:.0}h", d, h)
    }
}

/// Charge level bucket driving the indicator icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelTier {
    Full,
    High,
    Medium,
    Low,
    Critical,
}

impl LevelTier {
    /// Bucket a percentage; non-finite values count as empty
    pub fn from_percent(percent: f64) -> Self {
        let percent = if percent.is_finite() { percent } else { 0.0 };

        if percent >= 75.0 {
            LevelTier::Full
        } else if percent >= 50.0 {
            LevelTier::High
        } else if percent >= 25.0 {
            LevelTier::Medium
        } else if percent >= 10.0 {
            LevelTier::Low
        } else {
            LevelTier::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelTier::Full => "full",
            LevelTier::High => "high",
            LevelTier::Medium => "medium",
            LevelTier::Low => "low",
            LevelTier::Critical => "critical",
        }
    }
}

/// Indicator color override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Green,
    Yellow,
    Red,
    Gray,
}

impl LedColor {
    /// Charging wins, then discharging thresholds at 20% and 35%
    pub fn from_status(percent: f64, status: &str) -> Self {
        match status {
            "charging" => LedColor::Green,
            "discharging" if percent < 20.0 => LedColor::Red,
            "discharging" if percent < 35.0 => LedColor::Yellow,
            _ => LedColor::Gray,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedColor::Green => "green",
            LedColor::Yellow => "yellow",
            LedColor::Red => "red",
            LedColor::Gray => "gray",
        }
    }

    /// Parse the color back out of a rendered class list
    pub fn from_class(class: &str) -> Option<Self> {
        class.split_whitespace().find_map(|token| match token {
            "led-green" => Some(LedColor::Green),
            "led-yellow" => Some(LedColor::Yellow),
            "led-red" => Some(LedColor::Red),
            "led-gray" => Some(LedColor::Gray),
            _ => None,
        })
    }
}

/// Full indicator styling: base marker, level tier and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorClass {
    pub tier: LevelTier,
    pub color: LedColor,
}

impl IndicatorClass {
    pub fn select(percent: f64, status: &str) -> Self {
        Self {
            tier: LevelTier::from_percent(percent),
            color: LedColor::from_status(percent, status),
        }
    }
}

impl fmt::Display for IndicatorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{LED_BASE_CLASS} {LED_BASE_CLASS}-{} led-{}",
            self.tier.as_str(),
            self.color.as_str()
        )
    }
}
