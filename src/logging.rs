//! File logging.
//!
//! The terminal belongs to the UI, so tracing output goes to a file through a
//! non-blocking writer. Filter defaults to `info`, override with `RUST_LOG`.

use std::{fs::OpenOptions, path::Path};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_FILE: &str = "octave-scratchpad.log";

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines get flushed.
pub fn init(path: &Path) -> Result<WorkerGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %path.display(),
        "Logging initialized"
    );

    Ok(guard)
}
