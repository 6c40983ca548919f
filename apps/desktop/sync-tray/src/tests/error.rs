// Unit tests for error module
// Tests conversion from engine errors

use crate::error::TrayError;

use sync_client::error::{ConfigError, SessionError, TransportError};

/// **VALUE**: Engine errors keep their text when they surface from the tray.
///
/// **WHY THIS MATTERS**: The tray's exit message is all a user sees when the
/// helper cannot be reached.
///
/// **BUG THIS CATCHES**: Would catch a conversion that drops the message.
#[test]
fn given_transport_error_when_converted_then_session_variant_keeps_message() {
    let err: TrayError = TransportError::closed("helper went away").into();

    assert!(matches!(err, TrayError::Session { .. }));
    assert!(err.to_string().contains("helper went away"));
}

#[test]
fn given_session_error_when_converted_then_session_variant() {
    let err: TrayError = SessionError::engine_stopped("loop gone").into();

    assert!(matches!(err, TrayError::Session { .. }));
    assert!(err.to_string().starts_with("Session Error:"));
}

#[test]
fn given_launch_error_when_displayed_then_includes_location() {
    let err = TrayError::launch("no file");

    let text = err.to_string();

    assert!(text.starts_with("Launch Error: no file"));
    assert!(text.contains(".rs:"), "location should name the source file");
}

#[test]
fn given_config_error_when_converted_then_config_variant() {
    let err: TrayError = ConfigError::validation("poll interval out of range").into();

    assert!(matches!(err, TrayError::Config { .. }));
    assert!(err.to_string().contains("poll interval out of range"));
}
