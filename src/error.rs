//! Error types shared across the crate.
//!
//! The feed client and the session never surface these to their callers;
//! they are logged and folded into outcomes. The prediction client and the
//! status store return them directly.

use thiserror::Error;

// ---

/// Failure to get any HTTP response out of the telemetry endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    // ---
    /// Could not connect to the endpoint.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Any other request or body-read failure.
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // ---
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Failure reading or writing the persisted key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors returned by the prediction service client.
#[derive(Debug, Error)]
pub enum PredictionError {
    // ---
    /// Service answered with a non-success status.
    #[error("prediction service returned status {0}")]
    Status(u16),

    /// Request could not be sent or the body could not be read.
    #[error("prediction request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    // ---
    #[error("no data available to export")]
    Empty,

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
