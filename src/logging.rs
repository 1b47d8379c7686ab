//! Logging setup.
//!
//! Events always go to stderr. A daily-rolling file and, on Linux, the
//! systemd journal can be added through [`LoggingConfig`].
//!
//! The filter comes from the `SPARKIFY_LOG` environment variable when set,
//! otherwise from `logging.level` in the config file:
//! - `SPARKIFY_LOG=debug` logs every file as it is loaded
//! - `SPARKIFY_LOG=warn` only reports failed statements and files

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the global subscriber. Call once, before anything logs.
///
/// A log directory that cannot be used only disables the file layer; stderr
/// logging is still installed and the problem is reported there.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("SPARKIFY_LOG")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, file_error) = match config.directory.as_deref().map(file_writer) {
        Some(Ok(writer)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            None,
        ),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    #[cfg(target_os = "linux")]
    let journald_layer = if config.journald {
        tracing_journald::layer().ok()
    } else {
        None
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer);

    #[cfg(target_os = "linux")]
    let registry = registry.with(journald_layer);

    registry.try_init()?;

    if let Some(e) = file_error {
        tracing::warn!("File logging disabled: {:#}", e);
    }

    tracing::debug!(
        directory = ?config.directory,
        journald = config.journald,
        "Logging initialized"
    );
    Ok(())
}

/// Daily-rolling `sparkify-etl.log` writer under `log_dir`.
fn file_writer(log_dir: &Path) -> Result<NonBlocking> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("sparkify-etl.log")
        .build(log_dir)
        .with_context(|| format!("cannot open a log file in {}", log_dir.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes on drop, so it has to outlive every log call.
    static GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    Ok(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unusable_log_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = file_writer(&blocker.join("logs")).unwrap_err();
        assert!(err.to_string().contains("cannot create log directory"));
    }
}
