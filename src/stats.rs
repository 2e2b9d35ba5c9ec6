//! Rolling statistics over a reading sequence.
//!
//! [`aggregate`] produces the dashboard summary (rounded means, raw extrema);
//! [`spread`] produces the per-metric dispersion shown in reports. Both work
//! on raw values and treat each metric independently.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{Metric, Reading};

// ---

/// Summary of one reading sequence. All zero when the sequence is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    // ---
    pub avg_temp: f64,
    pub avg_humidity: f64,
    pub avg_soil_moisture: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
    pub min_soil_moisture: f64,
    pub max_soil_moisture: f64,
}

/// Mean, extrema and population dispersion of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spread {
    // ---
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub variance: f64,
    pub std_dev: f64,
}

/// Compute the dashboard summary for `readings`.
pub fn aggregate(readings: &[Reading]) -> Stats {
    // ---
    if readings.is_empty() {
        return Stats::default();
    }

    let (min_temp, max_temp) = extrema(readings, Metric::Temperature);
    let (min_humidity, max_humidity) = extrema(readings, Metric::Humidity);
    let (min_soil_moisture, max_soil_moisture) = extrema(readings, Metric::SoilMoisture);

    Stats {
        avg_temp: round1(mean(readings, Metric::Temperature)),
        avg_humidity: round1(mean(readings, Metric::Humidity)),
        avg_soil_moisture: round1(mean(readings, Metric::SoilMoisture)),
        min_temp,
        max_temp,
        min_humidity,
        max_humidity,
        min_soil_moisture,
        max_soil_moisture,
    }
}

/// Population variance and standard deviation of `metric`, plus mean and
/// extrema. Unrounded. All zero when `readings` is empty.
pub fn spread(readings: &[Reading], metric: Metric) -> Spread {
    // ---
    if readings.is_empty() {
        return Spread::default();
    }

    let mean = mean(readings, metric);
    let (min, max) = extrema(readings, metric);
    let variance = readings
        .iter()
        .map(|r| (r.value(metric) - mean).powi(2))
        .sum::<f64>()
        / readings.len() as f64;

    Spread {
        mean,
        min,
        max,
        variance,
        std_dev: variance.sqrt(),
    }
}

/// Round to one decimal place, half away from zero.
///
/// Rounds the exact binary value, so `20.15` (stored just below the tie)
/// becomes `20.1` while the exact tie `2.25` becomes `2.3`. Non-finite
/// input is returned unchanged.
pub fn round1(value: f64) -> f64 {
    // ---
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn mean(readings: &[Reading], metric: Metric) -> f64 {
    readings.iter().map(|r| r.value(metric)).sum::<f64>() / readings.len() as f64
}

fn extrema(readings: &[Reading], metric: Metric) -> (f64, f64) {
    // ---
    readings
        .iter()
        .map(|r| r.value(metric))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}
