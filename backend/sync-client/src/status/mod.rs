//! Status classification.
//!
//! Pure functions over the helper's numeric status code. Band membership is
//! tested with floored integer division exactly as the helper's consumers
//! always have; in particular [`has_settings_error`] uses a 200-wide band, so
//! it flags `400..600` and *not* the documented `200..=204` settings codes.

use crate::models::Status;

use std::fmt;

/// Known helper phases and error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Uninitialized,
    Initializing,
    ShuttingDown,
    Syncing,
    Pausing,
    Paused,
    SettingsIncomplete,
    RemoteUrlError,
    AuthenticationError,
    LocalDirectoryError,
    RemoteContainerError,
    CriticalError,
    Unknown(i64),
}

impl From<i64> for StatusCode {
    fn from(code: i64) -> Self {
        match code {
            0 => StatusCode::Uninitialized,
            1 => StatusCode::Initializing,
            2 => StatusCode::ShuttingDown,
            100 => StatusCode::Syncing,
            101 => StatusCode::Pausing,
            102 => StatusCode::Paused,
            200 => StatusCode::SettingsIncomplete,
            201 => StatusCode::RemoteUrlError,
            202 => StatusCode::AuthenticationError,
            203 => StatusCode::LocalDirectoryError,
            204 => StatusCode::RemoteContainerError,
            1000 => StatusCode::CriticalError,
            other => StatusCode::Unknown(other),
        }
    }
}

impl From<StatusCode> for i64 {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::Uninitialized => 0,
            StatusCode::Initializing => 1,
            StatusCode::ShuttingDown => 2,
            StatusCode::Syncing => 100,
            StatusCode::Pausing => 101,
            StatusCode::Paused => 102,
            StatusCode::SettingsIncomplete => 200,
            StatusCode::RemoteUrlError => 201,
            StatusCode::AuthenticationError => 202,
            StatusCode::LocalDirectoryError => 203,
            StatusCode::RemoteContainerError => 204,
            StatusCode::CriticalError => 1000,
            StatusCode::Unknown(other) => other,
        }
    }
}

/// Severity a collaborator should use when surfacing a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Info => write!(f, "info"),
            NotificationLevel::Warning => write!(f, "warning"),
            NotificationLevel::Error => write!(f, "error"),
        }
    }
}

/// In-progress band (syncing, pausing, paused): `floor(code / 100) == 1`.
pub fn is_active(code: i64) -> bool {
    code.div_euclid(100) == 1
}

/// `floor(code / 200) == 2`, kept literally.
pub fn has_settings_error(code: i64) -> bool {
    code.div_euclid(200) == 2
}

/// Items neither synced nor failed. Not clamped; may be negative.
///
/// Counts come straight off the wire, so the sum is taken in `i128`
/// where no pair of `i64` values can overflow.
pub fn remaining(status: &Status) -> i128 {
    i128::from(status.unsynced_count)
        - (i128::from(status.synced_count) + i128::from(status.failed_count))
}

/// Severity of a status code: critical band is an error, the documented
/// settings band (`200..=299`) a warning, everything else informational.
pub fn notification_level(code: i64) -> NotificationLevel {
    match code {
        c if c >= 1000 => NotificationLevel::Error,
        200..=299 => NotificationLevel::Warning,
        _ => NotificationLevel::Info,
    }
}

/// A notification is due only when the code actually changed.
pub fn notification_for(previous: i64, current: i64) -> Option<NotificationLevel> {
    (previous != current).then(|| notification_level(current))
}
