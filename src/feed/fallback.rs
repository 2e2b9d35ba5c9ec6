//! Synthetic readings used when the feed rejects a request with 400.
//!
//! Keeps the dashboard populated during demos and outages. Callers always
//! receive these wrapped in `FeedOutcome::Fallback`, never mixed with live data.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::Reading;

// ---

/// Spacing between synthetic samples.
pub const SAMPLE_SPACING_MINUTES: i64 = 30;

/// Generate `count` random readings, most recent first, the first stamped
/// `now` and each further one 30 minutes earlier.
///
/// Ranges: temperature 20..30, humidity 40..80, soil moisture 30..80.
/// Entry ids count down from `count` to 1.
pub fn generate(count: u32, now: DateTime<Utc>) -> Vec<Reading> {
    // ---
    let mut rng = rand::thread_rng();

    (0..count)
        .map(|i| Reading {
            temperature: rng.gen_range(20.0..30.0),
            humidity: rng.gen_range(40.0..80.0),
            soil_moisture: rng.gen_range(30.0..80.0),
            timestamp: now - Duration::minutes(SAMPLE_SPACING_MINUTES * i as i64),
            entry_id: u64::from(count - i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_shape_and_ranges() {
        // ---
        let now = Utc::now();
        let data = generate(48, now);

        assert_eq!(data.len(), 48);
        assert_eq!(data[0].timestamp, now);
        assert_eq!(data[0].entry_id, 48);
        assert_eq!(data[47].entry_id, 1);

        for pair in data.windows(2) {
            assert_eq!(pair[0].timestamp - pair[1].timestamp, Duration::minutes(30));
        }
        for r in &data {
            assert!((20.0..30.0).contains(&r.temperature));
            assert!((40.0..80.0).contains(&r.humidity));
            assert!((30.0..80.0).contains(&r.soil_moisture));
        }
    }

    #[test]
    fn test_zero_count() {
        assert!(generate(0, Utc::now()).is_empty());
    }
}
