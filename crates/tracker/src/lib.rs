//! Exercise Tracker
//!
//! Runtime around the exercise engine: loads settings, reads landmark
//! frames from a recording or stdin, drives the engine, surfaces throttled
//! feedback, and hands completed sessions to the session store.

pub mod controller;
pub mod settings;
pub mod source;

pub use controller::{SessionReport, TrackingController, TrackingHandle};
pub use settings::{LogFormat, TrackerSettings};
pub use source::{parse_line, read_frames, PoseRecord, SourceStats};

use feedback::LogNotifier;
use session_store::{SessionRepository, SessionStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Tracker error types
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(&'static str),

    #[error("Exercise definition rejected: {0}")]
    Exercise(#[from] exercise_engine::ConfigError),

    #[error("Exercise definition parse error: {0}")]
    Definition(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] session_store::StorageError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging
pub fn init_logging(settings: &TrackerSettings) -> Result<(), TrackerError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(settings.level())
        .with_target(true);

    let result = match settings.log_format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    result.map_err(|e| TrackerError::Logging(e.to_string()))
}

async fn open_input(settings: &TrackerSettings) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, TrackerError> {
    if settings.reads_stdin() {
        info!("Reading landmarks from stdin");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    info!("Reading landmarks from {}", settings.input);
    let file = tokio::fs::File::open(&settings.input).await?;
    Ok(Box::new(BufReader::new(file)))
}

/// Run one tracking session end to end
pub async fn run(settings: &TrackerSettings) -> Result<SessionReport, TrackerError> {
    let repository = Arc::new(match &settings.store_path {
        Some(path) => SessionRepository::open(path)?,
        None => SessionRepository::new(),
    });
    let store: Arc<dyn SessionStore> = repository.clone();
    let mut controller = TrackingController::new(
        settings.exercise_config()?,
        settings.target_reps,
        settings.feedback.clone(),
        LogNotifier,
        store,
    )?;

    let input = open_input(settings).await?;
    let (tx, rx) = mpsc::channel(settings.channel_capacity);
    let reader = tokio::spawn(read_frames(input, tx));

    let handle = controller.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping tracking");
            handle.stop();
        }
    });

    let report = controller.run(rx).await;
    interrupt.abort();

    let report = report?;
    if report.source_exhausted {
        // Sender is gone, so the reader has returned or is about to
        let stats = reader.await.map_err(std::io::Error::other)??;
        debug!("Pose source: {} frames, {} skipped", stats.frames, stats.skipped);
    } else {
        reader.abort();
    }

    if let (Some(path), Some(_)) = (&settings.store_path, report.record_id) {
        repository.persist(path)?;
    }
    Ok(report)
}
