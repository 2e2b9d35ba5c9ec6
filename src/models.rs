//! Simple data models for the farm sensor feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// One timestamped sample from the telemetry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Soil moisture, percent.
    pub soil_moisture: f64,
    pub timestamp: DateTime<Utc>,
    pub entry_id: u64,
}

impl Reading {
    /// Value of one metric of this reading.
    pub fn value(&self, metric: Metric) -> f64 {
        // ---
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
        }
    }
}

/// Raw feed entry as returned by the telemetry endpoint.
///
/// Field values arrive as strings (or null); anything unparseable maps to 0.
#[derive(Debug, Deserialize)]
pub struct RawFeedEntry {
    // ---
    #[serde(default)]
    pub field1: Value,
    #[serde(default)]
    pub field2: Value,
    #[serde(default)]
    pub field3: Value,
    pub created_at: DateTime<Utc>,
    pub entry_id: u64,
}

impl RawFeedEntry {
    // ---
    pub fn to_reading(&self) -> Reading {
        // ---
        Reading {
            temperature: parse_field(&self.field1),
            humidity: parse_field(&self.field2),
            soil_moisture: parse_field(&self.field3),
            timestamp: self.created_at,
            entry_id: self.entry_id,
        }
    }
}

/// Lenient float parse: longest numeric prefix of a string, or a JSON number.
/// Non-finite or missing values become 0.
fn parse_field(value: &Value) -> f64 {
    // ---
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s.trim()),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_leading_float(s: &str) -> Option<f64> {
    // ---
    (1..=s.len())
        .rev()
        .filter(|&end| s.is_char_boundary(end))
        .find_map(|end| s[..end].parse::<f64>().ok())
}

/// The three metrics carried by each reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Humidity,
    SoilMoisture,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::SoilMoisture];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::SoilMoisture => "Soil Moisture",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity | Metric::SoilMoisture => "%",
        }
    }
}

/// Health band of a single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for HealthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthBand::Healthy => "healthy",
            HealthBand::Warning => "warning",
            HealthBand::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Reachability of the telemetry endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiState {
    Online,
    Degraded,
    Offline,
}

impl std::fmt::Display for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiState::Online => "online",
            ApiState::Degraded => "degraded",
            ApiState::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Outcome of the most recent feed call, persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    // ---
    pub status: ApiState,
    /// Milliseconds.
    pub response_time: u64,
    pub last_check: DateTime<Utc>,
}

impl ApiStatus {
    // ---
    pub fn new(status: ApiState, response_time: u64) -> Self {
        Self {
            status,
            response_time,
            last_check: Utc::now(),
        }
    }

    /// Status shown before anything has been recorded.
    pub fn unknown() -> Self {
        Self::new(ApiState::Offline, 0)
    }
}
