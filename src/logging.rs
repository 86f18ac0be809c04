//! Tracing setup
//!
//! Log output:
//! - Always: console
//! - With `log_to_file`: daily-rotated file `olympus.YYYY-MM-DD.log` under the
//!   configured log directory

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::LoggingError;

/// Build the level filter: RUST_LOG wins, then the configured directive
pub fn build_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global tracing subscriber.
///
/// Returns the file writer guard when file logging is enabled; keep it alive
/// for as long as logs should be flushed.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(config);

    if !config.log_to_file {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()
            .map_err(|e| LoggingError::SubscriberInstall(Box::new(e)))?;
        return Ok(None);
    }

    let log_dir = config.resolved_log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|e| LoggingError::DirectoryCreationFailed {
        path: log_dir.display().to_string(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "olympus.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::SubscriberInstall(Box::new(e)))?;

    tracing::info!("Log directory: {}", log_dir.display());
    Ok(Some(guard))
}
