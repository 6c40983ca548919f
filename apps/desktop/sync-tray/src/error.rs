use common::ErrorLocation;

use sync_client::error::{ConfigError, CoreError, SessionError, TransportError};

use std::panic::Location;

use thiserror::Error;

/// Errors that end the tray process.
///
/// Engine errors are flattened to their display text; the location recorded
/// is where the tray gave up, the engine's own location stays in the text.
#[derive(Debug, Error)]
pub enum TrayError {
    /// Error from this App
    #[error("Tray Error: {message} {location}")]
    Tray {
        message: String,
        location: ErrorLocation,
    },

    /// Launch file missing, unreadable, already used or malformed
    #[error("Launch Error: {message} {location}")]
    Launch {
        message: String,
        location: ErrorLocation,
    },

    /// Engine configuration could not be loaded
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Session could not be started or driven
    #[error("Session Error: {message} {location}")]
    Session {
        message: String,
        location: ErrorLocation,
    },
}

impl TrayError {
    #[track_caller]
    pub fn launch(message: impl Into<String>) -> Self {
        TrayError::Launch {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for TrayError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        let message = error.to_string();
        let location = ErrorLocation::from(Location::caller());
        match error {
            CoreError::Config(_) => TrayError::Config { message, location },
            CoreError::Transport(_) | CoreError::Protocol(_) | CoreError::Session(_) => {
                TrayError::Session { message, location }
            }
        }
    }
}

impl From<ConfigError> for TrayError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        TrayError::from(CoreError::from(error))
    }
}

impl From<TransportError> for TrayError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        TrayError::from(CoreError::from(error))
    }
}

impl From<SessionError> for TrayError {
    #[track_caller]
    fn from(error: SessionError) -> Self {
        TrayError::from(CoreError::from(error))
    }
}
