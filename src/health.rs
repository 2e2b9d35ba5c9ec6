//! API health tracking.
//!
//! Keeps the outcome of the latest feed call in a [`StatusStore`] under a
//! fixed key, so the last known status is available across restarts and
//! before the first refresh of a new session completes.

use std::sync::Arc;

use tracing::warn;

use crate::models::ApiStatus;
use crate::store::StatusStore;

// ---

/// Key of the persisted status record.
pub const STATUS_KEY: &str = "feedApiStatus";

pub struct HealthTracker {
    store: Arc<dyn StatusStore>,
}

impl HealthTracker {
    // ---
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Persist `status`, replacing the previous record. Best-effort.
    pub fn record(&self, status: &ApiStatus) {
        // ---
        let json = match serde_json::to_string(status) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize API status: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(STATUS_KEY, &json) {
            warn!("Failed to persist API status: {}", e);
        }
    }

    /// Last recorded status, or offline/0ms/now when nothing usable is stored.
    pub fn current(&self) -> ApiStatus {
        // ---
        match self.store.get(STATUS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring unreadable API status record: {}", e);
                ApiStatus::unknown()
            }),
            Ok(None) => ApiStatus::unknown(),
            Err(e) => {
                warn!("Failed to read API status: {}", e);
                ApiStatus::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::ApiState;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_when_nothing_recorded() {
        // ---
        let tracker = HealthTracker::new(Arc::new(MemoryStore::new()));
        let status = tracker.current();

        assert_eq!(status.status, ApiState::Offline);
        assert_eq!(status.response_time, 0);
    }

    #[test]
    fn test_record_then_current() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let tracker = HealthTracker::new(store.clone());

        tracker.record(&ApiStatus::new(ApiState::Online, 120));
        tracker.record(&ApiStatus::new(ApiState::Degraded, 1800));

        let status = tracker.current();
        assert_eq!(status.status, ApiState::Degraded);
        assert_eq!(status.response_time, 1800);

        // Same record is visible to a second tracker on the same store.
        let other = HealthTracker::new(store);
        assert_eq!(other.current(), status);
    }

    #[test]
    fn test_unreadable_record_falls_back_to_default() {
        // ---
        let store = Arc::new(MemoryStore::new());
        store.set(STATUS_KEY, "{broken").unwrap();

        let tracker = HealthTracker::new(store);
        assert_eq!(tracker.current().status, ApiState::Offline);
    }
}
