//! One-shot launch file handed over by whoever starts the tray.
//!
//! The file holds `{"address": "<ws endpoint>", "identity": "<token>"}`. It is
//! read once and immediately overwritten with [`CONSUMED_MARKER`], so the
//! identity cannot be picked up by a second process.

use crate::error::TrayError;

use common::RedactedToken;

use sync_client::HELPER_DEFAULT_ENDPOINT;
use sync_client::config::ClientConfig;

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

pub const CONSUMED_MARKER: &str = "consumed";

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchInfo {
    /// Helper endpoint; may be empty when the config file names one.
    #[serde(default)]
    pub address: String,
    pub identity: RedactedToken,
}

impl LaunchInfo {
    /// Read the launch file and mark it consumed.
    ///
    /// # Errors
    ///
    /// Returns [`TrayError::Launch`] if the file cannot be read or rewritten,
    /// was already consumed, is not valid JSON, or carries an empty identity.
    pub fn consume(path: &Path) -> Result<Self, TrayError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TrayError::launch(format!(
                "Failed to read launch file {}: {e}",
                path.display()
            ))
        })?;

        if contents.trim() == CONSUMED_MARKER {
            return Err(TrayError::launch(format!(
                "Launch file {} was already used",
                path.display()
            )));
        }

        // Burn the file before anything else can fail.
        fs::write(path, CONSUMED_MARKER).map_err(|e| {
            TrayError::launch(format!(
                "Failed to mark launch file {} as consumed: {e}",
                path.display()
            ))
        })?;
        debug!("Launch file {} consumed", path.display());

        let launch: LaunchInfo = serde_json::from_str(&contents)
            .map_err(|e| TrayError::launch(format!("Invalid launch file: {e}")))?;

        if launch.identity.is_empty() {
            return Err(TrayError::launch("Launch file has an empty identity"));
        }

        info!(
            "Launch info read (address: '{}', identity: {} chars)",
            launch.address,
            launch.identity.len()
        );
        Ok(launch)
    }

    /// Endpoint to connect to: the config override, else the launch address,
    /// else the default local helper.
    pub fn endpoint(&self, config: &ClientConfig) -> String {
        config
            .endpoint
            .clone()
            .or_else(|| (!self.address.is_empty()).then(|| self.address.clone()))
            .unwrap_or_else(|| HELPER_DEFAULT_ENDPOINT.to_string())
    }
}
