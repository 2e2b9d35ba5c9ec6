//! Remote feed client.
//!
//! Fetches a window of readings from the telemetry endpoint, records the
//! call's health outcome exactly once, and never fails: every error becomes
//! either synthetic fallback data (HTTP 400) or an empty, unavailable outcome.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::health::HealthTracker;
use crate::models::{ApiState, ApiStatus, RawFeedEntry, Reading};
use crate::notice::{self, Notice, NoticeSender};

pub mod fallback;
pub mod transport;

pub use transport::{FeedResponse, FeedTransport, HttpTransport};

// ---

/// Samples requested for a one-day window.
pub const ONE_DAY_SAMPLES: u32 = 20;

/// Samples requested per day for longer windows (one per 30 minutes).
pub const SAMPLES_PER_DAY: u32 = 48;

/// Number of samples to request for a window of `window_days`.
pub fn sample_count(window_days: u32) -> u32 {
    // ---
    match window_days {
        0 | 1 => ONE_DAY_SAMPLES,
        days => days.saturating_mul(SAMPLES_PER_DAY),
    }
}

/// Result of one feed call.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    // ---
    /// Readings from the feed, most recent first. May be empty.
    Live(Vec<Reading>),

    /// Synthetic readings generated after a 400 response.
    Fallback(Vec<Reading>),

    /// The call failed; no readings.
    Unavailable { reason: String },
}

impl FeedOutcome {
    // ---
    pub fn readings(&self) -> &[Reading] {
        match self {
            FeedOutcome::Live(r) | FeedOutcome::Fallback(r) => r,
            FeedOutcome::Unavailable { .. } => &[],
        }
    }

    pub fn into_readings(self) -> Vec<Reading> {
        match self {
            FeedOutcome::Live(r) | FeedOutcome::Fallback(r) => r,
            FeedOutcome::Unavailable { .. } => Vec::new(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, FeedOutcome::Fallback(_))
    }
}

pub struct FeedClient {
    transport: Arc<dyn FeedTransport>,
    health: Arc<HealthTracker>,
    notices: NoticeSender,
    /// Successful calls at or above this latency are `degraded`. 0 disables.
    degraded_threshold_ms: u64,
}

impl FeedClient {
    // ---
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        health: Arc<HealthTracker>,
        notices: NoticeSender,
        degraded_threshold_ms: u64,
    ) -> Self {
        Self {
            transport,
            health,
            notices,
            degraded_threshold_ms,
        }
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn notices(&self) -> &NoticeSender {
        &self.notices
    }

    /// Fetch readings covering the last `window_days` days.
    pub async fn fetch_readings(&self, window_days: u32) -> FeedOutcome {
        // ---
        let count = sample_count(window_days);
        info!("Fetching sensor data for the past {} day(s), {} samples", window_days, count);

        let started = Instant::now();
        let result = self.transport.get_feed(count).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Feed request failed after {}ms: {}", elapsed_ms, e);
                return self.unavailable(elapsed_ms, e.to_string());
            }
        };

        if !response.is_success() {
            error!("Feed request failed with status: {}", response.status);

            if response.status == 400 {
                self.record(ApiState::Offline, elapsed_ms);
                let readings = fallback::generate(count, Utc::now());
                warn!("Feed returned 400, substituting {} synthetic readings", readings.len());
                notice::emit(&self.notices, Notice::UsingFallback { count: readings.len() });
                return FeedOutcome::Fallback(readings);
            }
            return self.unavailable(elapsed_ms, format!("API error: {}", response.status));
        }

        let readings = match parse_feeds(&response.body) {
            Ok(readings) => readings,
            Err(reason) => {
                error!("Unexpected feed response format: {}", reason);
                return self.unavailable(elapsed_ms, reason);
            }
        };

        let state = self.latency_state(elapsed_ms);
        self.record(state, elapsed_ms);

        if readings.is_empty() {
            info!("No sensor readings found in the response");
        } else {
            info!("Received {} readings in {}ms ({})", readings.len(), elapsed_ms, state);
        }
        FeedOutcome::Live(readings)
    }

    /// Most recent reading of the default one-day window.
    pub async fn fetch_latest(&self) -> Option<Reading> {
        self.fetch_readings(1).await.into_readings().into_iter().next()
    }

    fn latency_state(&self, elapsed_ms: u64) -> ApiState {
        // ---
        if self.degraded_threshold_ms > 0 && elapsed_ms >= self.degraded_threshold_ms {
            ApiState::Degraded
        } else {
            ApiState::Online
        }
    }

    fn record(&self, state: ApiState, elapsed_ms: u64) {
        self.health.record(&ApiStatus::new(state, elapsed_ms));
    }

    fn unavailable(&self, elapsed_ms: u64, reason: String) -> FeedOutcome {
        // ---
        self.record(ApiState::Offline, elapsed_ms);
        notice::emit(
            &self.notices,
            Notice::FeedUnavailable {
                reason: reason.clone(),
            },
        );
        FeedOutcome::Unavailable { reason }
    }
}

/// Map a feed body into readings, most recent first.
///
/// Fails when the body is not JSON or lacks a `feeds` array. Individual
/// entries without a valid `created_at` / `entry_id` are skipped.
fn parse_feeds(body: &str) -> Result<Vec<Reading>, String> {
    // ---
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("response is not JSON: {}", e))?;

    let feeds = value
        .get("feeds")
        .and_then(|f| f.as_array())
        .ok_or_else(|| "response missing 'feeds' array".to_string())?;

    let mut readings = Vec::with_capacity(feeds.len());
    for (i, item) in feeds.iter().enumerate() {
        match serde_json::from_value::<RawFeedEntry>(item.clone()) {
            Ok(entry) => readings.push(entry.to_reading()),
            Err(e) => debug!("Skipping feed entry {}: {} - Raw item: {}", i, e, item),
        }
    }

    // Feed is oldest-first.
    readings.reverse();
    Ok(readings)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::TransportError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        response: Mutex<Option<Result<FeedResponse, TransportError>>>,
        requested: Mutex<Vec<u32>>,
    }

    impl Canned {
        fn new(response: Result<FeedResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn status(status: u16, body: &str) -> Arc<Self> {
            Self::new(Ok(FeedResponse {
                status,
                body: body.to_string(),
            }))
        }
    }

    #[async_trait]
    impl FeedTransport for Canned {
        async fn get_feed(&self, results: u32) -> Result<FeedResponse, TransportError> {
            self.requested.lock().unwrap().push(results);
            self.response.lock().unwrap().take().expect("one call only")
        }
    }

    fn client(transport: Arc<Canned>, threshold_ms: u64) -> (FeedClient, Arc<MemoryStore>) {
        // ---
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(HealthTracker::new(store.clone()));
        (FeedClient::new(transport, health, notice::channel(), threshold_ms), store)
    }

    const THREE_ENTRIES: &str = r#"{
        "channel": {"id": 1},
        "feeds": [
            {"created_at": "2025-05-01T10:00:00Z", "entry_id": 1, "field1": "21.5", "field2": "55", "field3": "40.2"},
            {"created_at": "2025-05-01T10:30:00Z", "entry_id": 2, "field1": "22.0", "field2": "54", "field3": "39.8"},
            {"created_at": "2025-05-01T11:00:00Z", "entry_id": 3, "field1": "22.5", "field2": null, "field3": "39.1"}
        ]
    }"#;

    #[test]
    fn test_sample_count() {
        // ---
        assert_eq!(sample_count(1), 20);
        assert_eq!(sample_count(2), 96);
        assert_eq!(sample_count(7), 336);
    }

    #[tokio::test]
    async fn test_live_readings_are_most_recent_first() {
        // ---
        let transport = Canned::status(200, THREE_ENTRIES);
        let (client, _) = client(transport.clone(), 0);

        let outcome = client.fetch_readings(1).await;
        let ids: Vec<u64> = outcome.readings().iter().map(|r| r.entry_id).collect();

        assert!(matches!(outcome, FeedOutcome::Live(_)));
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(outcome.readings()[0].humidity, 0.0);
        assert_eq!(*transport.requested.lock().unwrap(), vec![20]);
        assert_eq!(client.health().current().status, ApiState::Online);
    }

    #[tokio::test]
    async fn test_bad_request_substitutes_fallback() {
        // ---
        let (client, _) = client(Canned::status(400, "bad"), 0);

        let outcome = client.fetch_readings(1).await;
        let readings = outcome.readings();

        assert!(outcome.is_synthetic());
        assert_eq!(readings.len(), 20);
        for pair in readings.windows(2) {
            assert_eq!(
                pair[0].timestamp - pair[1].timestamp,
                chrono::Duration::minutes(30)
            );
        }
        assert_eq!(client.health().current().status, ApiState::Offline);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        // ---
        let (client, _) = client(Canned::status(503, ""), 0);

        let outcome = client.fetch_readings(3).await;

        assert_eq!(
            outcome,
            FeedOutcome::Unavailable {
                reason: "API error: 503".to_string()
            }
        );
        assert!(outcome.readings().is_empty());
        assert_eq!(client.health().current().status, ApiState::Offline);
    }

    #[tokio::test]
    async fn test_transport_error_is_unavailable() {
        // ---
        let (client, _) = client(Canned::new(Err(TransportError::Timeout)), 0);
        let mut notices = client.notices.subscribe();

        let outcome = client.fetch_readings(1).await;

        assert!(matches!(outcome, FeedOutcome::Unavailable { .. }));
        assert!(matches!(notices.try_recv(), Ok(Notice::FeedUnavailable { .. })));
        assert_eq!(client.health().current().status, ApiState::Offline);
    }

    #[tokio::test]
    async fn test_missing_feeds_array_is_unavailable() {
        // ---
        for body in [r#"{"channel": {}}"#, r#"{"feeds": {}}"#, "<html>"] {
            let (client, _) = client(Canned::status(200, body), 0);
            let outcome = client.fetch_readings(1).await;

            assert!(matches!(outcome, FeedOutcome::Unavailable { .. }), "body {}", body);
            assert_eq!(client.health().current().status, ApiState::Offline);
        }
    }

    #[tokio::test]
    async fn test_empty_feed_is_live_and_online() {
        // ---
        let (client, _) = client(Canned::status(200, r#"{"feeds": []}"#), 0);

        let outcome = client.fetch_readings(1).await;

        assert_eq!(outcome, FeedOutcome::Live(Vec::new()));
        assert_eq!(client.health().current().status, ApiState::Online);
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        // ---
        let body = r#"{"feeds": [
            {"created_at": "2025-05-01T10:00:00Z", "entry_id": 1, "field1": "20"},
            {"created_at": "yesterday", "entry_id": 2, "field1": "21"},
            {"created_at": "2025-05-01T10:30:00Z", "field1": "21.5"},
            {"created_at": "2025-05-01T11:00:00Z", "entry_id": 3, "field1": "22"}
        ]}"#;
        let (client, _) = client(Canned::status(200, body), 0);

        let ids: Vec<u64> = client
            .fetch_readings(1)
            .await
            .readings()
            .iter()
            .map(|r| r.entry_id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_slow_success_is_degraded() {
        // ---
        struct Slow;

        #[async_trait]
        impl FeedTransport for Slow {
            async fn get_feed(&self, _results: u32) -> Result<FeedResponse, TransportError> {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(FeedResponse {
                    status: 200,
                    body: r#"{"feeds": []}"#.to_string(),
                })
            }
        }

        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(HealthTracker::new(store));
        let client = FeedClient::new(Arc::new(Slow), health, notice::channel(), 5);

        client.fetch_readings(1).await;
        let status = client.health().current();

        assert_eq!(status.status, ApiState::Degraded);
        assert!(status.response_time >= 5);
    }

    #[tokio::test]
    async fn test_fetch_latest() {
        // ---
        let (client, _) = client(Canned::status(200, THREE_ENTRIES), 0);
        let latest = client.fetch_latest().await.unwrap();
        assert_eq!(latest.entry_id, 3);
        assert_eq!(latest.temperature, 22.5);
    }
}
