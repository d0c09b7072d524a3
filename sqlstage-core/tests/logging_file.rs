//! Log file output.
//!
//! Installing a global subscriber can only happen once per process, so this
//! file holds a single test.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use sqlstage_core::{DiagnosticSink, Severity, SqlStageError, TracingSink, init_logging};

#[test]
fn test_log_file_receives_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sqlstage.log");

    init_logging(0, false, Some(path.as_path())).expect("first initialization succeeds");

    tracing::info!("staging run started");
    TracingSink.emit(
        Severity::Warning,
        "Error while resolving hostname: XS99avroce_ora",
    );
    tracing::debug!("below the configured level");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("staging run started"));
    assert!(contents.contains("Error while resolving hostname: XS99avroce_ora"));
    assert!(!contents.contains("below the configured level"));
    assert!(!contents.contains('\u{1b}'), "log file must not contain ANSI codes");

    let second = init_logging(0, false, None);
    assert!(matches!(second, Err(SqlStageError::Configuration { .. })));
}
