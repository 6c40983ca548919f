use crate::protocol::RequestKind;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Problems with individual messages. None of these end the session: the
/// offending message is logged and dropped and the store stays untouched.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Malformed Response Error: {message} {location}")]
    Malformed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unexpected Action Error: '{action}' {location}")]
    UnexpectedAction {
        action: String,
        location: ErrorLocation,
    },

    #[error("Correlation Mismatch Error: expected {expected}, message says '{actual}' {location}")]
    HeadMismatch {
        expected: RequestKind,
        actual: String,
        location: ErrorLocation,
    },

    #[error("Correlation Error: response arrived with no request outstanding {location}")]
    NothingPending { location: ErrorLocation },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}

impl ProtocolError {
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        ProtocolError::Malformed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unexpected_action(action: impl Into<String>) -> Self {
        ProtocolError::UnexpectedAction {
            action: action.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn head_mismatch(expected: RequestKind, actual: impl Into<String>) -> Self {
        ProtocolError::HeadMismatch {
            expected,
            actual: actual.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn nothing_pending() -> Self {
        ProtocolError::NothingPending {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::Malformed {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
