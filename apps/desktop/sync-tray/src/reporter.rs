//! Turns engine events into log lines, standing in for tray notifications.

use sync_client::status::{NotificationLevel, is_active, remaining};
use sync_client::{EngineEvent, SessionHandle};

use common::describe_reply;

use log::{Level, debug, log, warn};
use tokio::sync::broadcast;

/// Log level and text a collaborator would surface for `event`.
pub fn describe(event: &EngineEvent) -> (Level, String) {
    match event {
        EngineEvent::Authenticated => (Level::Info, "Connected to sync helper".to_string()),
        EngineEvent::SettingsUpdated(settings) => (
            Level::Info,
            format!(
                "Settings loaded (container: {}, directory: {}, complete: {})",
                settings.remote_container.as_deref().unwrap_or("-"),
                settings.local_directory.as_deref().unwrap_or("-"),
                settings.is_complete()
            ),
        ),
        EngineEvent::StatusUpdated(status) => (
            Level::Debug,
            format!(
                "Status {}: {} synced, {} remaining, {} failed{}",
                status.status_code,
                status.synced_count,
                remaining(status),
                status.failed_count,
                if is_active(status.status_code) {
                    " (active)"
                } else {
                    ""
                }
            ),
        ),
        EngineEvent::Notification { level, code } => {
            let level = match level {
                NotificationLevel::Info => Level::Info,
                NotificationLevel::Warning => Level::Warn,
                NotificationLevel::Error => Level::Error,
            };
            (level, format!("Helper status changed: {code:?}"))
        }
        EngineEvent::OpenSettingsRequested => (
            Level::Warn,
            "Sync settings need attention; opening settings".to_string(),
        ),
        EngineEvent::SettingsWriteRejected { code } => (
            Level::Warn,
            format!("Helper rejected the new settings ({})", describe_reply(*code)),
        ),
        EngineEvent::CommandFailed { kind, code } => (
            Level::Warn,
            format!("Helper refused '{kind}' ({})", describe_reply(*code)),
        ),
        EngineEvent::Teardown(reason) => (Level::Info, format!("Session ended: {reason}")),
    }
}

/// Log every event until the session ends.
///
/// There is no settings window in a headless tray, so an open-settings
/// request is acknowledged as soon as it has been reported.
pub async fn report_events(handle: SessionHandle, mut events: broadcast::Receiver<EngineEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event reporter fell behind, skipped {skipped} events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let (level, message) = describe(&event);
        log!(level, "{message}");

        match event {
            EngineEvent::OpenSettingsRequested => {
                if let Err(e) = handle.acknowledge_open_settings().await {
                    debug!("Could not acknowledge settings request: {e}");
                }
            }
            EngineEvent::Teardown(_) => break,
            _ => {}
        }
    }
}
