// Unit tests for logger module initialization logic
// Tests focus on thread-safety and error handling

use crate::error::TrayError;
use crate::logger::{LOG_FILE_NAME, initialize, open_log_file};

use std::path::PathBuf;

use serial_test::serial;

fn test_log_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("sync-tray-test-logger");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: A global logger can only be installed once. If the
/// second call errors, startup paths that both initialize would crash the tray.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when trying to set a global logger twice.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid directory
    let dir = test_log_dir();

    // WHEN: Calling initialize twice
    let first = initialize(&dir);
    let second = initialize(&dir);

    // THEN: Both return Ok
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
    assert!(dir.join(LOG_FILE_NAME).exists());
}

/// **VALUE**: Verifies an unwritable log directory is an error, not a panic.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` were unwrapped.
#[test]
#[serial]
fn given_invalid_log_dir_when_log_file_opened_then_tray_error() {
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    let result = open_log_file(&invalid_dir);

    assert!(matches!(result, Err(TrayError::Tray { .. })));
}

#[test]
#[serial]
fn given_valid_dir_when_log_file_opened_then_file_created() {
    let dir = test_log_dir();

    let file = open_log_file(&dir);

    assert!(file.is_ok());
    assert!(dir.join(LOG_FILE_NAME).exists());
}
