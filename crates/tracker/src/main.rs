//! Exercise Tracker - Main Entry Point

use anyhow::Context;
use std::path::PathBuf;
use tracker::{init_logging, run, SessionReport, TrackerSettings};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = TrackerSettings::load(settings_path.as_deref()).context("Failed to load settings")?;
    init_logging(&settings)?;

    info!("=== Exercise Tracker v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Tracking {} ({:?} side), target {} reps",
        settings.exercise, settings.side, settings.target_reps
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let result = runtime.block_on(run(&settings));
    // A stdin read still parked on the blocking pool is not waited for
    runtime.shutdown_background();

    let report = result.context("Tracking failed")?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SessionReport) {
    let summary = &report.summary;
    let extremum = summary
        .extremum
        .map(|v| format!("{:.1}°", v))
        .unwrap_or_else(|| "n/a".to_string());
    let saved = report
        .record_id
        .map(|id| format!(", saved as session #{}", id))
        .unwrap_or_default();

    println!(
        "{}: {} valid / {} invalid / {} total (target {}), extreme angle {}, started {}{}{}",
        summary.exercise,
        summary.valid_reps,
        summary.invalid_reps,
        summary.total_reps,
        summary.target_reps,
        extremum,
        summary.started_at.to_rfc3339(),
        saved,
        if report.completed { "" } else { " [incomplete]" }
    );
}
