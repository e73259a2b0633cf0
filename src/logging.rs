//! Logging initializer
//!
//! The terminal belongs to the HUD, so traces only ever go to a daily rolling
//! file. Without a log directory, logging is off.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix for the rolling log
const LOG_NAME: &str = "tactical-hud.log";

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered lines get flushed.
pub fn init_logging(log_dir: Option<&Path>, level: Option<&str>) -> Result<Option<WorkerGuard>> {
    let Some(dir) = log_dir else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)?;

    // RUST_LOG wins, then --log-level, then info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("info")))?;

    let file_appender = tracing_appender::rolling::daily(dir, LOG_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    Ok(Some(guard))
}
