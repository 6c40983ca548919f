use crate::protocol::RequestKind;
use crate::session::ConnectionState;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors surfaced to callers issuing commands on a session.
#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("Precondition Error: {command} requires an authenticated session (state: {state}) {location}")]
    NotAuthenticated {
        command: RequestKind,
        state: ConnectionState,
        location: ErrorLocation,
    },

    #[error("Invalid Settings Error: {reason} {location}")]
    InvalidSettings {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Engine Stopped Error: {message} {location}")]
    EngineStopped {
        message: String,
        location: ErrorLocation,
    },
}

impl SessionError {
    #[track_caller]
    pub fn not_authenticated(command: RequestKind, state: ConnectionState) -> Self {
        SessionError::NotAuthenticated {
            command,
            state,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        SessionError::InvalidSettings {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn engine_stopped(message: impl Into<String>) -> Self {
        SessionError::EngineStopped {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
