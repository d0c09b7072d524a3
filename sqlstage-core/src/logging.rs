//! Shared logging utilities.
//!
//! Provides the tracing subscriber setup for the CLI and the default
//! diagnostic sink built on top of it.

use crate::Result;
use crate::adapters::{DiagnosticSink, Severity};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Maps CLI verbosity flags onto a tracing level.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// Events always go to stderr. When `log_file` is given they are also
/// appended to that file without ANSI colouring.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
/// * `log_file` - Optional file to append to
///
/// # Example
/// ```rust,no_run
/// use sqlstage_core::logging::init_logging;
///
/// init_logging(1, false, None).expect("Failed to initialize logging");
/// ```
///
/// # Errors
/// Returns a configuration error if the log file cannot be opened or a
/// global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = level_for(verbose, quiet);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    crate::SqlStageError::io(format!("Failed to open log file {}", path.display()), e)
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::SqlStageError::configuration(format!("Failed to initialize logging: {}", e))
        })?;

    Ok(())
}

/// Diagnostic sink that forwards to `tracing`.
///
/// `tracing` has no critical level, so critical diagnostics are emitted at
/// `ERROR` with a `severity = "critical"` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!("{}", message),
            Severity::Info => tracing::info!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Critical => tracing::error!(severity = "critical", "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Logging can only be initialized once per test process,
    // so the global subscriber is not installed here.

    #[test]
    fn test_verbosity_levels() {
        let test_cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 5), tracing::Level::ERROR),
            ((false, 0), tracing::Level::INFO),
            ((false, 1), tracing::Level::DEBUG),
            ((false, 2), tracing::Level::TRACE),
            ((false, 10), tracing::Level::TRACE),
        ];

        for ((quiet, verbose), expected) in test_cases {
            assert_eq!(
                level_for(verbose, quiet),
                expected,
                "Failed for quiet={}, verbose={}",
                quiet,
                verbose
            );
        }
    }

    #[test]
    fn test_tracing_sink_accepts_every_severity() {
        let sink = TracingSink;
        for severity in [
            Severity::Debug,
            Severity::Info,
            Severity::Warning,
            Severity::Critical,
        ] {
            sink.emit(severity, "diagnostic");
        }
    }
}
