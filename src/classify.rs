//! Threshold classification of a single metric value into a health band.

use crate::models::{HealthBand, Metric};

// ---

/// Band limits for one metric. Values inside `[warn_low, warn_high]` are
/// healthy; values inside `[crit_low, crit_high]` but outside the healthy
/// band are a warning; anything beyond is critical.
struct Thresholds {
    crit_low: f64,
    warn_low: f64,
    warn_high: f64,
    crit_high: f64,
}

const fn thresholds(metric: Metric) -> Thresholds {
    // ---
    match metric {
        Metric::Temperature => Thresholds {
            crit_low: 10.0,
            warn_low: 15.0,
            warn_high: 30.0,
            crit_high: 35.0,
        },
        Metric::Humidity => Thresholds {
            crit_low: 20.0,
            warn_low: 30.0,
            warn_high: 80.0,
            crit_high: 90.0,
        },
        Metric::SoilMoisture => Thresholds {
            crit_low: 20.0,
            warn_low: 30.0,
            warn_high: 70.0,
            crit_high: 80.0,
        },
    }
}

/// Classify `value` of `metric` into a health band.
pub fn classify(value: f64, metric: Metric) -> HealthBand {
    // ---
    let t = thresholds(metric);

    if value < t.crit_low || value > t.crit_high {
        HealthBand::Critical
    } else if value < t.warn_low || value > t.warn_high {
        HealthBand::Warning
    } else {
        HealthBand::Healthy
    }
}
