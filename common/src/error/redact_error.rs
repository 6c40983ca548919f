use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a secret wrapper is asked to leave the process in a form
/// that would expose it.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Redaction Error: refusing to serialize a secret: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },
}
