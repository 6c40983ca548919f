use common::ErrorLocation;

use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Problems loading or saving `config.json`. A missing file is not one of
/// them: it yields the defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Read Error: {path}: {source} {location}")]
    ReadError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config Parse Error: {path} is not valid config JSON: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Config Write Error: {path}: {source} {location}")]
    WriteError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config Directory Not Found Error: platform has no config directory {location}")]
    DirectoryNotFound { location: ErrorLocation },

    #[error("Config Serialization Error: {reason} {location}")]
    SerializeError {
        location: ErrorLocation,
        reason: String,
    },

    #[error("Config Validation Error: {reason} {location}")]
    ValidationError {
        location: ErrorLocation,
        reason: String,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn read(path: &Path, source: io::Error) -> Self {
        ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn parse(path: &Path, error: &serde_json::Error) -> Self {
        ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }

    #[track_caller]
    pub fn write(path: &Path, source: io::Error) -> Self {
        ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source,
        }
    }

    #[track_caller]
    pub fn directory_not_found() -> Self {
        ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn serialize(error: &serde_json::Error) -> Self {
        ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: error.to_string(),
        }
    }

    #[track_caller]
    pub fn validation(reason: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: reason.into(),
        }
    }
}
