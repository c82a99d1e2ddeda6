//! Payload normalization
//!
//! The monitor endpoint is loosely typed: numbers may arrive as strings,
//! rate and ETA may be placeholder text such as `"still calculating"`, and
//! the payload may be wrapped in a `{"result": ...}` envelope. Everything is
//! folded into [`NormalizedStatus`] here and nothing past this module sees
//! the raw JSON.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A rate or ETA reading: numeric when parseable, opaque text otherwise
#[derive(Debug, Clone, Default)]
pub enum Reading {
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

impl Reading {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Reading::Absent,
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Reading::Number)
                .unwrap_or_else(|| Reading::Text(n.to_string())),
            Some(Value::String(s)) => match parse_finite(s) {
                Some(n) => Reading::Number(n),
                None => Reading::Text(s.clone()),
            },
            Some(other) => Reading::Text(other.to_string()),
        }
    }

    /// Finite numeric value, if any
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Reading::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Non-empty text value, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reading::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Reading {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reading::Number(a), Reading::Number(b)) => same_f64(*a, *b),
            (Reading::Text(a), Reading::Text(b)) => a == b,
            (Reading::Absent, Reading::Absent) => true,
            _ => false,
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Number(n) => serializer.serialize_f64(*n),
            Reading::Text(s) => serializer.serialize_str(s),
            Reading::Absent => serializer.serialize_none(),
        }
    }
}

/// Canonical battery status used for rendering
///
/// `percent` and `voltage` are NaN when the source value could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedStatus {
    pub available: bool,
    pub percent: f64,
    pub voltage: f64,
    pub rate_per_hour: Reading,
    pub eta_hours: Reading,
    pub status: String,
}

impl Default for NormalizedStatus {
    fn default() -> Self {
        Self {
            available: true,
            percent: f64::NAN,
            voltage: f64::NAN,
            rate_per_hour: Reading::Absent,
            eta_hours: Reading::Absent,
            status: String::new(),
        }
    }
}

impl PartialEq for NormalizedStatus {
    fn eq(&self, other: &Self) -> bool {
        self.available == other.available
            && same_f64(self.percent, other.percent)
            && same_f64(self.voltage, other.voltage)
            && self.rate_per_hour == other.rate_per_hour
            && self.eta_hours == other.eta_hours
            && self.status == other.status
    }
}

impl NormalizedStatus {
    /// True when the payload should take the unavailable rendering path
    pub fn is_unavailable(&self) -> bool {
        !self.available && !self.percent.is_finite()
    }
}

/// Normalize an arbitrary payload. Never fails.
pub fn normalize(raw: &Value) -> NormalizedStatus {
    let empty = Map::new();
    let fields = match raw {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(inner)) => inner,
            _ => map,
        },
        _ => &empty,
    };

    NormalizedStatus {
        available: fields.get("available").map(coerce_bool).unwrap_or(true),
        percent: coerce_number(fields.get("percent")),
        voltage: coerce_number(fields.get("voltage")),
        rate_per_hour: Reading::from_value(fields.get("rate_per_hour")),
        eta_hours: Reading::from_value(fields.get("eta_hours")),
        status: coerce_status(fields.get("status")),
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "0" | "no" | "off"
        ),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(f64::NAN)
}

fn coerce_status(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn same_f64(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}
