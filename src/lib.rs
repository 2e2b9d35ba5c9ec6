//! `farmwatch` - farm sensor feed monitoring.
//!
//! Polls a remote time-series feed of temperature, humidity and soil moisture,
//! keeps rolling statistics and health bands for the latest readings, tracks
//! the feed's availability, and talks to an external prediction service.
//!
//! Module boundaries:
//! - `feed` fetches readings and never fails to its caller
//! - `session` owns the refresh lifecycle on top of `feed`
//! - `stats`, `classify` and `report` are pure functions over readings
//! - `health` and `store` keep the persisted API status record

pub mod classify;
pub mod config;
pub mod error;
pub mod feed;
pub mod health;
pub mod models;
pub mod notice;
pub mod predict;
pub mod report;
pub mod session;
pub mod stats;
pub mod store;

pub use classify::classify;
pub use config::Config;
pub use error::{PredictionError, ReportError, StoreError, TransportError};
pub use feed::{FeedClient, FeedOutcome, FeedResponse, FeedTransport, HttpTransport};
pub use health::HealthTracker;
pub use models::{ApiState, ApiStatus, HealthBand, Metric, RawFeedEntry, Reading};
pub use notice::Notice;
pub use predict::PredictionClient;
pub use session::{RefreshOutcome, RefreshTask, SensorSession, SessionSnapshot};
pub use stats::{aggregate, spread, Spread, Stats};
pub use store::{FileStore, MemoryStore, StatusStore};
