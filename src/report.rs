//! Reporting helpers: date-range filtering, chart series and CSV export.
//!
//! Chart series cap values at 100 for display. Capping is presentation only:
//! [`crate::stats::aggregate`] and [`crate::stats::spread`] always see raw values.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ReportError;
use crate::models::{Metric, Reading};
use crate::stats::round1;

// ---

/// Upper bound applied to charted values.
pub const DISPLAY_CAP: f64 = 100.0;

/// Most bins a distribution is split into.
pub const MAX_BINS: usize = 10;

pub const CSV_HEADER: &str = "Date,Time,Temperature,Humidity,Soil Moisture,Entry ID";

/// Value as drawn on a chart.
pub fn cap_display(value: f64) -> f64 {
    value.min(DISPLAY_CAP)
}

/// Readings whose UTC date lies within `from..=to`.
pub fn filter_range(readings: &[Reading], from: NaiveDate, to: NaiveDate) -> Vec<Reading> {
    // ---
    readings
        .iter()
        .filter(|r| (from..=to).contains(&r.timestamp.date_naive()))
        .cloned()
        .collect()
}

/// Mean of one metric for a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAverage {
    // ---
    pub date: NaiveDate,
    /// Mean of capped values, 1 decimal.
    pub average: f64,
    /// Mean of raw values, 1 decimal.
    pub raw_average: f64,
    pub count: usize,
}

/// Per-day averages of `metric`, oldest day first.
pub fn daily_averages(readings: &[Reading], metric: Metric) -> Vec<DailyAverage> {
    // ---
    let mut days: BTreeMap<NaiveDate, (f64, f64, usize)> = BTreeMap::new();
    for r in readings {
        let raw = r.value(metric);
        let entry = days.entry(r.timestamp.date_naive()).or_insert((0.0, 0.0, 0));
        entry.0 += cap_display(raw);
        entry.1 += raw;
        entry.2 += 1;
    }

    days.into_iter()
        .map(|(date, (capped, raw, count))| DailyAverage {
            date,
            average: round1(capped / count as f64),
            raw_average: round1(raw / count as f64),
            count,
        })
        .collect()
}

/// One histogram bucket, `[start, end)` except the last which includes `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn label(&self) -> String {
        format!("{:.1}-{:.1}", self.start, self.end)
    }
}

/// Histogram of capped `metric` values over at most [`MAX_BINS`] equal-width
/// bins spanning the floor of the minimum to the ceiling of the maximum.
pub fn distribution(readings: &[Reading], metric: Metric) -> Vec<Bin> {
    // ---
    if readings.is_empty() {
        return Vec::new();
    }

    let values: Vec<f64> = readings.iter().map(|r| cap_display(r.value(metric))).collect();
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min).floor();
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max).ceil();

    let bins = MAX_BINS.min((hi - lo) as usize + 1);
    let width = match (hi - lo) / bins as f64 {
        w if w > 0.0 => w,
        _ => 1.0,
    };

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Write `readings` as CSV, one row per reading in the given order.
pub fn write_csv<W: Write>(readings: &[Reading], mut out: W) -> Result<(), ReportError> {
    // ---
    if readings.is_empty() {
        return Err(ReportError::Empty);
    }

    writeln!(out, "{}", CSV_HEADER)?;
    for r in readings {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            r.timestamp.format("%Y-%m-%d"),
            r.timestamp.format("%H:%M:%S"),
            r.temperature,
            r.humidity,
            r.soil_moisture,
            r.entry_id
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Default export file name for a given day.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("farm-data-{}.csv", date.format("%Y-%m-%d"))
}
