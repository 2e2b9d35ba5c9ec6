//! Application entry point for the `farmwatch` binary.
//!
//! Wires configuration, logging, the status store, the feed client and the
//! sensor session together, then runs one of:
//! - `monitor` (default) – refresh on a timer and log stats and health bands
//! - `export` – one refresh, then write the readings as CSV
//! - `status` – print the persisted API status
//! - `predict-crop`, `detect-disease`, `analyze-disease` – prediction service calls
//!
//! # Environment Variables
//! See [`farmwatch::config::load_from_env`] for the feed and service settings.
//! - `FARMWATCH_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `FORCE_COLOR` (optional) – force ANSI colours on or off
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::filter::EnvFilter;

use farmwatch::notice::{self, Notice};
use farmwatch::predict::{CropPredictionRequest, SoilType};
use farmwatch::report;
use farmwatch::{
    config, spread, Config, FeedClient, FileStore, HealthTracker, HttpTransport, Metric,
    PredictionClient, RefreshOutcome, SensorSession, SessionSnapshot,
};

// ---

#[derive(Parser, Debug)]
#[command(name = "farmwatch")]
#[command(about = "Farm sensor feed monitor")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh on a timer and log each cycle until Ctrl-C
    Monitor,

    /// Refresh once and export the readings as CSV
    Export {
        /// History window in days (defaults to WINDOW_DAYS)
        #[arg(long)]
        days: Option<u32>,

        /// Output file (defaults to farm-data-<today>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the last recorded feed API status
    Status,

    /// Recommend a crop from soil and climate parameters
    PredictCrop {
        #[arg(long)]
        temperature: f64,
        #[arg(long)]
        humidity: f64,
        #[arg(long)]
        moisture: f64,
        #[arg(long, value_enum)]
        soil_type: SoilType,
        #[arg(long)]
        nitrogen: f64,
        #[arg(long, default_value_t = 0.0)]
        potassium: f64,
        #[arg(long, default_value_t = 0.0)]
        phosphorus: f64,
    },

    /// Classify plant disease from an image
    DetectDisease { image: PathBuf },

    /// Free-text disease analysis of an image
    AnalyzeDisease { image: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let cfg = config::load_from_env()?;
    cfg.log_config();

    match args.command.unwrap_or(Command::Monitor) {
        Command::Monitor => monitor(&cfg).await,
        Command::Export { days, out } => export(&cfg, days, out).await,
        Command::Status => {
            let status = build_health(&cfg).current();
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::PredictCrop {
            temperature,
            humidity,
            moisture,
            soil_type,
            nitrogen,
            potassium,
            phosphorus,
        } => {
            let request = CropPredictionRequest {
                temperature,
                humidity,
                moisture,
                soil_type,
                nitrogen,
                potassium,
                phosphorus,
            };
            let prediction = prediction_client(&cfg)?.predict_crop(&request).await?;
            println!("Recommended crop: {}", prediction.predicted_crop);
            Ok(())
        }
        Command::DetectDisease { image } => {
            let (bytes, name) = read_image(&image)?;
            let result = prediction_client(&cfg)?.predict_disease(bytes, &name).await?;
            println!(
                "{} (confidence {:.1}%)",
                result.prediction.predicted_class,
                result.prediction.confidence * 100.0
            );
            Ok(())
        }
        Command::AnalyzeDisease { image } => {
            let (bytes, name) = read_image(&image)?;
            let result = prediction_client(&cfg)?.analyze_disease(bytes, &name).await?;
            println!("{}", result.analysis);
            Ok(())
        }
    }
}

// ---

async fn monitor(cfg: &Config) -> Result<()> {
    // ---
    let session = Arc::new(
        build_session(cfg, cfg.window_days)?
            .with_refresh_interval(Duration::from_secs(cfg.refresh_interval_secs)),
    );

    let mut notices = session.subscribe();
    let watcher = Arc::clone(&session);
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(Notice::Updated { .. }) => log_snapshot(&watcher.snapshot()),
                Ok(notice) => log_notice(&notice),
                Err(RecvError::Lagged(n)) => tracing::warn!("Dropped {} notices", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let task = session.start();
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    task.stop();
    Ok(())
}

async fn export(cfg: &Config, days: Option<u32>, out: Option<PathBuf>) -> Result<()> {
    // ---
    let session = build_session(cfg, days.unwrap_or(cfg.window_days))?;

    match session.refresh().await {
        RefreshOutcome::Failed { reason } => {
            return Err(anyhow!("Failed to fetch sensor data: {}", reason))
        }
        RefreshOutcome::NoData => return Err(anyhow!("No sensor data available")),
        RefreshOutcome::Updated { synthetic: true, .. } => {
            tracing::warn!("Exporting synthetic fallback data");
        }
        RefreshOutcome::Updated { .. } => {}
    }

    let path =
        out.unwrap_or_else(|| PathBuf::from(report::export_file_name(Utc::now().date_naive())));
    let file = fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    report::write_csv(&session.readings(), std::io::BufWriter::new(file))?;

    tracing::info!("CSV file written to {}", path.display());
    Ok(())
}

fn build_health(cfg: &Config) -> Arc<HealthTracker> {
    Arc::new(HealthTracker::new(Arc::new(FileStore::new(&cfg.status_store_path))))
}

fn build_session(cfg: &Config, window_days: u32) -> Result<SensorSession> {
    // ---
    let transport = HttpTransport::from_config(cfg)?;
    let feed = FeedClient::new(
        Arc::new(transport),
        build_health(cfg),
        notice::channel(),
        cfg.degraded_threshold_ms,
    );
    Ok(SensorSession::new(Arc::new(feed), window_days))
}

fn prediction_client(cfg: &Config) -> Result<PredictionClient> {
    Ok(PredictionClient::new(
        &cfg.prediction_url,
        Duration::from_secs(cfg.http_timeout_secs),
    )?)
}

fn read_image(path: &Path) -> Result<(Vec<u8>, String)> {
    // ---
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok((bytes, name))
}

fn log_snapshot(snap: &SessionSnapshot) {
    // ---
    let s = &snap.stats;
    tracing::info!(
        "API {} ({}ms){} - {} readings",
        snap.api_status.status,
        snap.api_status.response_time,
        if snap.is_synthetic { " [synthetic]" } else { "" },
        snap.readings.len()
    );
    tracing::info!(
        "avg temp {:.1}°C [{}..{}], humidity {:.1}% [{}..{}], soil {:.1}% [{}..{}]",
        s.avg_temp,
        s.min_temp,
        s.max_temp,
        s.avg_humidity,
        s.min_humidity,
        s.max_humidity,
        s.avg_soil_moisture,
        s.min_soil_moisture,
        s.max_soil_moisture
    );

    for metric in Metric::ALL {
        let d = spread(&snap.readings, metric);
        tracing::debug!("{} std dev {:.1}", metric.label(), d.std_dev);
    }

    if let (Some(latest), Some(health)) = (&snap.latest, snap.latest_health()) {
        for (metric, band) in health {
            tracing::info!(
                "latest #{} {}: {}{} ({})",
                latest.entry_id,
                metric.label(),
                latest.value(metric),
                metric.unit(),
                band
            );
        }
    }
}

fn log_notice(notice: &Notice) {
    // ---
    match notice {
        Notice::Updated { count } => tracing::info!("Sensor data updated ({} readings)", count),
        Notice::NoData => tracing::warn!("No sensor data available"),
        Notice::UsingFallback { count } => {
            tracing::warn!("Feed unavailable, showing {} sample readings", count)
        }
        Notice::FeedUnavailable { reason } => {
            tracing::error!("Failed to fetch sensor data: {}", reason)
        }
        Notice::RefreshFailed { reason } => tracing::error!("Refresh failed: {}", reason),
    }
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Log level controlled by `RUST_LOG`, else the `FARMWATCH_LOG_LEVEL` env var
///
/// This should be called once at startup before any logging macros are invoked.
fn init_tracing() {
    // ---
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("FARMWATCH_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},reqwest=warn,hyper=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
