//! Authoritative settings/status state for one session.
//!
//! The session engine is the single writer. Collaborators read a
//! [`StoreSnapshot`] that the lifecycle loop publishes after every event.

use crate::models::{Settings, Status};
use crate::session::ConnectionState;
use crate::status::has_settings_error;

/// Flags the engine raises for the UI collaborator to act upon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiStateFlags {
    /// The settings window should be opened. Raised at most once per session;
    /// only the collaborator clears it.
    pub open_settings_requested: bool,
}

/// What changed when a status response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub previous: Status,
    pub current: Status,
    pub open_settings_raised: bool,
}

impl StatusUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Default)]
pub struct StateStore {
    settings: Settings,
    status: Status,
    flags: UiStateFlags,
    first_status_seen: bool,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn flags(&self) -> UiStateFlags {
        self.flags
    }

    /// Replace settings wholesale with a successful GetSettings response.
    ///
    /// Returns true if the stored value changed.
    pub(crate) fn replace_settings(&mut self, settings: Settings) -> bool {
        if self.settings == settings {
            return false;
        }
        self.settings = settings;
        true
    }

    /// Replace status wholesale with a successful GetStatus response.
    ///
    /// The first status of the session decides whether the settings window
    /// must be opened: a settings-band error or a helper that says it cannot
    /// sync raises the flag.
    pub(crate) fn replace_status(&mut self, status: Status) -> StatusUpdate {
        let previous = std::mem::replace(&mut self.status, status);

        let mut open_settings_raised = false;
        if !self.first_status_seen {
            self.first_status_seen = true;
            let needs_settings =
                has_settings_error(status.status_code) || status.can_sync == Some(false);
            if needs_settings && !self.flags.open_settings_requested {
                self.flags.open_settings_requested = true;
                open_settings_raised = true;
            }
        }

        StatusUpdate {
            previous,
            current: status,
            open_settings_raised,
        }
    }

    pub(crate) fn acknowledge_open_settings(&mut self) {
        self.flags.open_settings_requested = false;
    }

    pub fn snapshot(&self, connection: ConnectionState) -> StoreSnapshot {
        StoreSnapshot {
            settings: self.settings.clone(),
            status: self.status,
            flags: self.flags,
            connection,
        }
    }
}

/// Read-only copy of the store handed to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub settings: Settings,
    pub status: Status,
    pub flags: UiStateFlags,
    pub connection: ConnectionState,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        StateStore::default().snapshot(ConnectionState::Connecting)
    }
}
