//! Logging setup for hosts embedding the controller.
//!
//! Installs a `tracing-subscriber` registry filtered by `ANCRYPT_LOG`,
//! writing to stderr and optionally to a daily log file. Secret values
//! and passwords are never logged by this crate.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "ANCRYPT_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "ancrypt=info";

/// Log file name prefix.
pub const LOG_FILE_PREFIX: &str = "ancrypt";

/// Subscriber installation failure.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log file appender could not be created.
    #[error("log file setup failed: {0}")]
    File(String),

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Keeps the background log writer alive. Flushes on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
}

/// Parse [`LOG_ENV`], falling back to [`DEFAULT_FILTER`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. With `log_dir`, also write
/// `ancrypt.<date>.log` files there.
///
/// # Errors
///
/// - [`TelemetryError::File`] if the log directory cannot be used
/// - [`TelemetryError::AlreadyInstalled`] if a subscriber exists
pub fn init(log_dir: Option<&Path>) -> Result<TelemetryGuard, TelemetryError> {
    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| TelemetryError::File(e.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))?;

    Ok(TelemetryGuard { _file: file_guard })
}
