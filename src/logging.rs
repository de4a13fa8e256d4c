//! Tracing subscriber bootstrap for processes embedding the engine

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: stdout always, plus a daily rolling file if configured
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process. A second call fails because a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, anyhow::Error> {
    let log_filter = tracing_subscriber::EnvFilter::try_new(&config.level)?;
    let registry = tracing_subscriber::registry().with(log_filter);

    // Add file logging if configured
    if let Some(log_file) = &config.file {
        let (log_dir, file_prefix) = rolling_file_target(log_file);
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, &file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
        tracing::info!("Logging to {}/{}.<date>", log_dir, file_prefix);
        Ok(Some(guard))
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
        Ok(None)
    }
}

/// Directory and file prefix for the rolling appender
///
/// The appender adds a date suffix, so a trailing `.log` is dropped from the prefix.
fn rolling_file_target(log_file: &str) -> (String, String) {
    let log_path = Path::new(log_file);
    let log_dir = log_path
        .parent()
        .and_then(|p| p.to_str())
        .filter(|p| !p.is_empty())
        .unwrap_or(".");
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("stellar-regression.log");
    let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

    (log_dir.to_string(), file_prefix.to_string())
}
