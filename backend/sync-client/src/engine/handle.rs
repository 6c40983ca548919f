//! Collaborator-facing handle to a running session.

use crate::engine::machine::{EngineCommand, EngineEvent, TeardownReason};
use crate::error::SessionError;
use crate::models::{Settings, Status};
use crate::session::ConnectionState;
use crate::store::StoreSnapshot;

use std::sync::Arc;

use log::debug;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot, watch};

/// A command plus the channel its verdict goes back on.
pub(crate) struct CommandEnvelope {
    command: EngineCommand,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

impl CommandEnvelope {
    pub(crate) fn into_parts(self) -> (EngineCommand, oneshot::Sender<Result<(), SessionError>>) {
        (self.command, self.reply)
    }
}

/// Handle to a running session.
///
/// Reads return the latest snapshot published by the event loop and never
/// block on it. Commands are queued to the loop and resolved in order.
///
/// # Thread Safety
///
/// This type is `Clone`; all clones drive the same session. Dropping every
/// clone shuts the session down.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<CommandEnvelope>,
    snapshot: Arc<RwLock<StoreSnapshot>>,
    events: broadcast::Sender<EngineEvent>,
    closed: watch::Receiver<Option<TeardownReason>>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<CommandEnvelope>,
        snapshot: Arc<RwLock<StoreSnapshot>>,
        events: broadcast::Sender<EngineEvent>,
        closed: watch::Receiver<Option<TeardownReason>>,
    ) -> Self {
        Self {
            command_tx,
            snapshot,
            events,
            closed,
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn get_settings(&self) -> Settings {
        self.snapshot.read().await.settings.clone()
    }

    pub async fn get_status(&self) -> Status {
        self.snapshot.read().await.status
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.snapshot.read().await.connection
    }

    pub async fn is_authenticated(&self) -> bool {
        self.connection_state().await == ConnectionState::Authenticated
    }

    pub async fn should_open_settings(&self) -> bool {
        self.snapshot.read().await.flags.open_settings_requested
    }

    pub async fn request_start(&self) -> Result<(), SessionError> {
        self.send(EngineCommand::Start).await
    }

    pub async fn request_pause(&self) -> Result<(), SessionError> {
        self.send(EngineCommand::Pause).await
    }

    pub async fn request_shutdown(&self) -> Result<(), SessionError> {
        self.send(EngineCommand::Shutdown).await
    }

    /// Write new settings to the helper. The store only changes once the
    /// helper acknowledges the write and the follow-up read returns.
    pub async fn submit_settings(&self, settings: Settings) -> Result<(), SessionError> {
        self.send(EngineCommand::SubmitSettings(settings)).await
    }

    /// The collaborator has opened the settings window.
    pub async fn acknowledge_open_settings(&self) -> Result<(), SessionError> {
        self.send(EngineCommand::AcknowledgeOpenSettings).await
    }

    /// New receiver for engine events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Wait until the session has been torn down.
    ///
    /// Returns `None` only if the event loop vanished without reporting a
    /// reason.
    pub async fn closed(&self) -> Option<TeardownReason> {
        let mut closed = self.closed.clone();
        if closed.wait_for(Option::is_some).await.is_err() {
            debug!("Session loop dropped its teardown channel");
        }
        let reason = closed.borrow().clone();
        reason
    }

    async fn send(&self, command: EngineCommand) -> Result<(), SessionError> {
        let (reply, verdict) = oneshot::channel();

        self.command_tx
            .send(CommandEnvelope { command, reply })
            .await
            .map_err(|e| SessionError::engine_stopped(format!("session loop gone: {e}")))?;

        verdict
            .await
            .map_err(|e| SessionError::engine_stopped(format!("session loop dropped command: {e}")))?
    }
}
