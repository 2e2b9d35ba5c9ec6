//! Sensor data session.
//!
//! Owns the refresh lifecycle consumed by display code: holds the current
//! readings, latest reading, stats, API status, loading flag and last error,
//! and refreshes them on a timer or on demand.
//!
//! Refresh cycles started from the timer run back to back. A manual
//! [`SensorSession::refresh`] may overlap a timer cycle; whichever finishes
//! last writes the held state, and each write replaces the state wholesale.
//! The loading flag stays set while any cycle is in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::feed::{FeedClient, FeedOutcome};
use crate::models::{ApiStatus, HealthBand, Metric, Reading};
use crate::notice::{self, Notice};
use crate::stats::{aggregate, Stats};

// ---

/// Default time between automatic refreshes.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Point-in-time copy of everything the session exposes.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    // ---
    /// Most recent first.
    pub readings: Vec<Reading>,
    pub latest: Option<Reading>,
    pub api_status: ApiStatus,
    pub stats: Stats,
    pub loading: bool,
    pub error: Option<String>,
    /// Held readings came from the fallback generator.
    pub is_synthetic: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Health band of each metric of the latest reading.
    pub fn latest_health(&self) -> Option<[(Metric, HealthBand); 3]> {
        // ---
        let latest = self.latest.as_ref()?;
        Some(Metric::ALL.map(|m| (m, classify(latest.value(m), m))))
    }
}

/// How one refresh cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated { count: usize, synthetic: bool },
    NoData,
    Failed { reason: String },
}

pub struct SensorSession {
    feed: Arc<FeedClient>,
    window_days: u32,
    refresh_interval: Duration,
    state: RwLock<SessionSnapshot>,
    in_flight: AtomicUsize,
}

impl SensorSession {
    // ---
    pub fn new(feed: Arc<FeedClient>, window_days: u32) -> Self {
        // ---
        let state = SessionSnapshot {
            readings: Vec::new(),
            latest: None,
            api_status: feed.health().current(),
            stats: Stats::default(),
            loading: false,
            error: None,
            is_synthetic: false,
            last_updated: None,
        };

        Self {
            feed,
            window_days: window_days.max(1),
            refresh_interval: REFRESH_INTERVAL,
            state: RwLock::new(state),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_refresh_interval(mut self, every: Duration) -> Self {
        self.refresh_interval = every;
        self
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Receive notices from this session and its feed client.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.feed.notices().subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.read().readings.clone()
    }

    pub fn latest(&self) -> Option<Reading> {
        self.read().latest.clone()
    }

    pub fn stats(&self) -> Stats {
        self.read().stats
    }

    pub fn api_status(&self) -> ApiStatus {
        self.read().api_status.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Run one refresh cycle and return once its result is applied.
    pub async fn refresh(&self) -> RefreshOutcome {
        // ---
        let _cycle = InFlight::enter(self);

        let outcome = self.feed.fetch_readings(self.window_days).await;
        let api_status = self.feed.health().current();
        let notices = self.feed.notices();

        let mut state = self.write();
        state.api_status = api_status;

        match outcome {
            FeedOutcome::Unavailable { reason } => {
                // Held readings and stats stay as they were.
                warn!("Sensor data refresh failed: {}", reason);
                state.error = Some(reason.clone());
                notice::emit(notices, Notice::RefreshFailed { reason: reason.clone() });
                RefreshOutcome::Failed { reason }
            }
            outcome if outcome.readings().is_empty() => {
                info!("No sensor data available");
                notice::emit(notices, Notice::NoData);
                RefreshOutcome::NoData
            }
            outcome => {
                let synthetic = outcome.is_synthetic();
                let readings = outcome.into_readings();
                let count = readings.len();

                state.stats = aggregate(&readings);
                state.latest = readings.first().cloned();
                state.readings = readings;
                state.is_synthetic = synthetic;
                state.last_updated = Some(Utc::now());

                debug!("Latest reading: {:?}", state.latest);
                debug!("Calculated stats: {:?}", state.stats);
                notice::emit(notices, Notice::Updated { count });
                RefreshOutcome::Updated { count, synthetic }
            }
        }
    }

    /// Refresh now and then every refresh interval until the returned task
    /// is stopped or dropped.
    pub fn start(self: &Arc<Self>) -> RefreshTask {
        // ---
        let session = Arc::clone(self);
        let every = self.refresh_interval;
        info!("Starting sensor refresh every {:?}", every);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!("Auto-refreshing sensor data");
                session.refresh().await;
            }
        });

        RefreshTask { handle }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Marks one refresh cycle in flight. Dropping it, including when the cycle
/// is cancelled mid-fetch, clears `loading` once no other cycle remains.
struct InFlight<'a> {
    session: &'a SensorSession,
}

impl<'a> InFlight<'a> {
    fn enter(session: &'a SensorSession) -> Self {
        // ---
        let mut state = session.write();
        session.in_flight.fetch_add(1, Ordering::SeqCst);
        state.loading = true;
        state.error = None;
        Self { session }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // ---
        let mut state = self.session.write();
        let remaining = self.session.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        state.loading = remaining > 0;
    }
}

/// Handle to a session's refresh timer. Dropping it cancels the timer.
#[derive(Debug)]
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
