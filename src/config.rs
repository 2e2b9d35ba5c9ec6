//! Configuration loader for `farmwatch`.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Nothing else in the crate reads the environment.
//!
use std::env;

use anyhow::{anyhow, bail, Result};

/// Parse an optional integer variable with a default value.
macro_rules! parse_u64 {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_FEED_URL: &str = "https://api.thingspeak.com";
pub const DEFAULT_PREDICTION_URL: &str = "https://ankys-capstone-backend.hf.space";
pub const DEFAULT_STATUS_STORE_PATH: &str = "farmwatch-status.json";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Telemetry API base URL.
    pub feed_url: String,

    /// Telemetry channel id.
    pub channel_id: String,

    /// Telemetry read key.
    pub api_key: String,

    /// Days of history each refresh requests.
    pub window_days: u32,

    /// Seconds between automatic refreshes.
    pub refresh_interval_secs: u64,

    /// HTTP timeout for feed and prediction calls.
    pub http_timeout_secs: u64,

    /// Successful feed calls at least this slow are reported as degraded (0 = never).
    pub degraded_threshold_ms: u64,

    /// JSON file holding the persisted API status.
    pub status_store_path: String,

    /// Prediction service base URL.
    pub prediction_url: String,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `FEED_CHANNEL_ID` – telemetry channel id
/// - `FEED_API_KEY` – telemetry read key
///
/// Optional:
/// - `FEED_API_URL` – telemetry base URL (default: ThingSpeak)
/// - `WINDOW_DAYS` – history window per refresh (default: 1)
/// - `REFRESH_INTERVAL_SECS` – auto refresh period (default: 300)
/// - `HTTP_TIMEOUT_SECS` – request timeout (default: 10)
/// - `DEGRADED_THRESHOLD_MS` – degraded latency threshold (default: 1000)
/// - `STATUS_STORE_PATH` – status record file (default: `farmwatch-status.json`)
/// - `PREDICTION_API_URL` – prediction service base URL
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    load_from(|name| env::var(name).ok())
}

/// Same as [`load_from_env`] but reading variables through `lookup`.
pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let channel_id = require!(lookup, "FEED_CHANNEL_ID");
    let api_key = require!(lookup, "FEED_API_KEY");
    let feed_url = lookup("FEED_API_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
    let prediction_url =
        lookup("PREDICTION_API_URL").unwrap_or_else(|| DEFAULT_PREDICTION_URL.to_string());
    let status_store_path =
        lookup("STATUS_STORE_PATH").unwrap_or_else(|| DEFAULT_STATUS_STORE_PATH.to_string());

    let window_days = parse_u64!(lookup, "WINDOW_DAYS", 1);
    let refresh_interval_secs = parse_u64!(lookup, "REFRESH_INTERVAL_SECS", 300);
    let http_timeout_secs = parse_u64!(lookup, "HTTP_TIMEOUT_SECS", 10);
    let degraded_threshold_ms = parse_u64!(lookup, "DEGRADED_THRESHOLD_MS", 1000);

    if window_days == 0 || window_days > u64::from(u32::MAX) {
        bail!("Invalid WINDOW_DAYS: {} (must be a positive number of days)", window_days);
    }
    if refresh_interval_secs == 0 {
        bail!("Invalid REFRESH_INTERVAL_SECS: must be at least 1");
    }

    Ok(Config {
        feed_url,
        channel_id,
        api_key,
        window_days: window_days as u32,
        refresh_interval_secs,
        http_timeout_secs,
        degraded_threshold_ms,
        status_store_path,
        prediction_url,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the API key while showing all other values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  FEED_API_URL          : {}", self.feed_url);
        tracing::info!("  FEED_CHANNEL_ID       : {}", self.channel_id);
        tracing::info!("  FEED_API_KEY          : {}", mask(&self.api_key));
        tracing::info!("  WINDOW_DAYS           : {}", self.window_days);
        tracing::info!("  REFRESH_INTERVAL_SECS : {}", self.refresh_interval_secs);
        tracing::info!("  HTTP_TIMEOUT_SECS     : {}", self.http_timeout_secs);
        tracing::info!("  DEGRADED_THRESHOLD_MS : {}", self.degraded_threshold_ms);
        tracing::info!("  STATUS_STORE_PATH     : {}", self.status_store_path);
        tracing::info!("  PREDICTION_API_URL    : {}", self.prediction_url);
    }
}

/// Keep the last 4 characters of a secret.
fn mask(secret: &str) -> String {
    // ---
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        // ---
        let cfg = load_from(lookup(&[("FEED_CHANNEL_ID", "2836185"), ("FEED_API_KEY", "ABCDEF")])).unwrap();

        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cfg.window_days, 1);
        assert_eq!(cfg.refresh_interval_secs, 300);
        assert_eq!(cfg.http_timeout_secs, 10);
        assert_eq!(cfg.degraded_threshold_ms, 1000);
        assert_eq!(cfg.status_store_path, DEFAULT_STATUS_STORE_PATH);
    }

    #[test]
    fn test_overrides() {
        // ---
        let cfg = load_from(lookup(&[
            ("FEED_CHANNEL_ID", "1"),
            ("FEED_API_KEY", "K"),
            ("WINDOW_DAYS", "7"),
            ("DEGRADED_THRESHOLD_MS", "0"),
            ("FEED_API_URL", "http://localhost:9000"),
        ]))
        .unwrap();

        assert_eq!(cfg.window_days, 7);
        assert_eq!(cfg.degraded_threshold_ms, 0);
        assert_eq!(cfg.feed_url, "http://localhost:9000");
    }

    #[test]
    fn test_missing_required() {
        // ---
        let err = load_from(lookup(&[("FEED_API_KEY", "K")])).unwrap_err();
        assert!(err.to_string().contains("FEED_CHANNEL_ID"));
    }

    #[test]
    fn test_invalid_numbers() {
        // ---
        let base = [("FEED_CHANNEL_ID", "1"), ("FEED_API_KEY", "K")];

        let mut vars = base.to_vec();
        vars.push(("WINDOW_DAYS", "0"));
        assert!(load_from(lookup(&vars)).is_err());

        let mut vars = base.to_vec();
        vars.push(("REFRESH_INTERVAL_SECS", "soon"));
        assert!(load_from(lookup(&vars)).is_err());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("L2SET7F8QJITXQHX"), "****XQHX");
        assert_eq!(mask("abc"), "****");
    }
}
