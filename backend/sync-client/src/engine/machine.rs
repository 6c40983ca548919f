use crate::correlator::{self, CorrelationStrategy, Correlator};
use crate::dispatcher::Dispatcher;
use crate::error::{SessionError, TransportError};
use crate::models::{Settings, Status};
use crate::protocol::{InboundMessage, Reply, Request, RequestKind};
use crate::session::{ConnectionState, HandshakeOutcome, Session};
use crate::status::{NotificationLevel, StatusCode, notification_for};
use crate::store::{StateStore, StoreSnapshot};

use common::{RedactedToken, ReplyCode, describe_reply};

use std::fmt;

use log::{debug, error, info, warn};

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownReason {
    UserShutdown,
    HandshakeRejected,
    /// The helper stopped accepting our identity mid-session.
    Unauthorized,
    TransportClosed,
    TransportError(String),
}

impl TeardownReason {
    /// Terminal connection state recorded for this reason.
    pub fn final_state(&self) -> ConnectionState {
        match self {
            TeardownReason::UserShutdown | TeardownReason::TransportClosed => {
                ConnectionState::Closed
            }
            TeardownReason::HandshakeRejected
            | TeardownReason::Unauthorized
            | TeardownReason::TransportError(_) => ConnectionState::Errored,
        }
    }
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownReason::UserShutdown => write!(f, "shutdown requested"),
            TeardownReason::HandshakeRejected => write!(f, "helper rejected our identity"),
            TeardownReason::Unauthorized => write!(f, "helper revoked authorization"),
            TeardownReason::TransportClosed => write!(f, "connection to helper closed"),
            TeardownReason::TransportError(message) => {
                write!(f, "connection to helper failed: {message}")
            }
        }
    }
}

/// Things collaborators may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Authenticated,
    SettingsUpdated(Settings),
    StatusUpdated(Status),
    /// The status code changed; surface it at `level`.
    Notification {
        level: NotificationLevel,
        code: StatusCode,
    },
    OpenSettingsRequested,
    SettingsWriteRejected {
        code: Option<ReplyCode>,
    },
    CommandFailed {
        kind: RequestKind,
        code: Option<ReplyCode>,
    },
    Teardown(TeardownReason),
}

/// Commands a collaborator may issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Pause,
    Shutdown,
    SubmitSettings(Settings),
    AcknowledgeOpenSettings,
}

/// Side effects requested by the engine, carried out in order by the
/// lifecycle controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(Request),
    Emit(EngineEvent),
    /// Cancel polling, close the transport, tell collaborators. Produced at
    /// most once per session.
    Teardown(TeardownReason),
}

/// Session + store + correlator, driven one input at a time.
pub struct SessionEngine {
    session: Session,
    store: StateStore,
    correlator: Box<dyn Correlator>,
    teardown: Option<TeardownReason>,
}

impl SessionEngine {
    pub fn new(identity: RedactedToken, strategy: CorrelationStrategy) -> Self {
        Self::with_correlator(identity, correlator::for_strategy(strategy))
    }

    pub fn with_correlator(identity: RedactedToken, correlator: Box<dyn Correlator>) -> Self {
        Self {
            session: Session::new(identity),
            store: StateStore::new(),
            correlator,
            teardown: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn strategy(&self) -> CorrelationStrategy {
        self.correlator.strategy()
    }

    /// Requests sent and not yet answered.
    pub fn outstanding(&self) -> usize {
        self.correlator.outstanding()
    }

    pub fn teardown_reason(&self) -> Option<&TeardownReason> {
        self.teardown.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_some()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot(self.session.connection())
    }

    /// The transport is up: send our identity.
    pub fn on_open(&mut self) -> Vec<Effect> {
        if !self.session.transition(ConnectionState::Open) {
            warn!(
                "Session {}: open event ignored in state {}",
                self.session.id(),
                self.session.connection()
            );
            return Vec::new();
        }

        if !self.session.begin_handshake() {
            return Vec::new();
        }

        info!("Session {}: connected, sending identity", self.session.id());
        match self.dispatcher().identify() {
            Ok(request) => vec![Effect::Send(request)],
            Err(e) => {
                error!("Session {}: could not send identity: {e}", self.session.id());
                Vec::new()
            }
        }
    }

    /// One inbound text frame.
    pub fn on_text(&mut self, text: &str) -> Vec<Effect> {
        if self.session.is_terminal() {
            debug!(
                "Session {}: discarding response received after teardown",
                self.session.id()
            );
            return Vec::new();
        }

        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Session {}: dropping unreadable frame: {e}", self.session.id());
                return Vec::new();
            }
        };

        if self.session.is_authenticated() && message.is_unauthorized() {
            warn!(
                "Session {}: helper no longer accepts our identity (action: {:?})",
                self.session.id(),
                message.action()
            );
            self.session.revoke();
            return self.teardown(TeardownReason::Unauthorized);
        }

        let kind = match self.correlator.correlate(&message) {
            Ok(kind) => kind,
            Err(e) => {
                warn!("Session {}: dropping response: {e}", self.session.id());
                return Vec::new();
            }
        };

        if kind != RequestKind::Identify && !self.session.is_authenticated() {
            warn!(
                "Session {}: dropping '{kind}' response received before authentication",
                self.session.id()
            );
            return Vec::new();
        }

        match Reply::decode(kind, &message) {
            Ok(reply) => self.resolve(reply),
            Err(e) => {
                warn!("Session {}: dropping '{kind}' response: {e}", self.session.id());
                Vec::new()
            }
        }
    }

    /// Polling timer fired.
    pub fn on_poll_tick(&mut self) -> Vec<Effect> {
        if !self.session.is_authenticated() {
            return Vec::new();
        }

        self.send_or_log(|dispatcher| dispatcher.get_status())
    }

    /// A collaborator command.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`SessionError`] when the command is refused;
    /// nothing is sent in that case.
    pub fn on_command(&mut self, command: EngineCommand) -> Result<Vec<Effect>, SessionError> {
        let request = match command {
            EngineCommand::Shutdown => return Ok(self.shutdown()),
            EngineCommand::AcknowledgeOpenSettings => {
                self.store.acknowledge_open_settings();
                return Ok(Vec::new());
            }
            EngineCommand::Start => self.dispatcher().start()?,
            EngineCommand::Pause => self.dispatcher().pause()?,
            EngineCommand::SubmitSettings(settings) => self.dispatcher().put_settings(settings)?,
        };

        Ok(vec![Effect::Send(request)])
    }

    /// User-initiated shutdown: tell the helper if we still can, then tear
    /// down.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        if self.is_torn_down() {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.session.is_writable() {
            match self.dispatcher().shutdown() {
                Ok(request) => effects.push(Effect::Send(request)),
                Err(e) => warn!("Session {}: shutdown not sent: {e}", self.session.id()),
            }
        }

        effects.extend(self.teardown(TeardownReason::UserShutdown));
        effects
    }

    pub fn on_transport_closed(&mut self) -> Vec<Effect> {
        self.teardown(TeardownReason::TransportClosed)
    }

    pub fn on_transport_error(&mut self, error: &TransportError) -> Vec<Effect> {
        self.teardown(TeardownReason::TransportError(error.to_string()))
    }

    fn resolve(&mut self, reply: Reply) -> Vec<Effect> {
        match reply {
            Reply::Identify { accepted, code } => self.resolve_identify(accepted, code),
            Reply::Control { kind, ok: true, .. } => {
                debug!("Session {}: '{kind}' acknowledged", self.session.id());
                self.send_or_log(|dispatcher| dispatcher.get_status())
            }
            Reply::Control { kind, ok: false, code } => {
                warn!(
                    "Session {}: '{kind}' refused by helper ({})",
                    self.session.id(),
                    describe_reply(code)
                );
                vec![Effect::Emit(EngineEvent::CommandFailed { kind, code })]
            }
            Reply::SettingsWritten { created: true, .. } => {
                info!("Session {}: settings written, refreshing", self.session.id());
                self.send_or_log(|dispatcher| dispatcher.get_settings())
            }
            Reply::SettingsWritten {
                created: false,
                code,
            } => {
                warn!(
                    "Session {}: settings write rejected ({})",
                    self.session.id(),
                    describe_reply(code)
                );
                vec![Effect::Emit(EngineEvent::SettingsWriteRejected { code })]
            }
            Reply::Settings(settings) => {
                if self.store.replace_settings(settings.clone()) {
                    info!("Session {}: settings updated", self.session.id());
                    vec![Effect::Emit(EngineEvent::SettingsUpdated(settings))]
                } else {
                    Vec::new()
                }
            }
            Reply::Status(status) => self.resolve_status(status),
        }
    }

    fn resolve_identify(&mut self, accepted: bool, code: Option<ReplyCode>) -> Vec<Effect> {
        match self.session.complete_handshake(accepted) {
            HandshakeOutcome::Accepted => {
                info!("Session {}: identity accepted", self.session.id());
                let mut effects = vec![Effect::Emit(EngineEvent::Authenticated)];
                effects.extend(self.send_or_log(|dispatcher| dispatcher.get_settings()));
                effects.extend(self.send_or_log(|dispatcher| dispatcher.get_status()));
                effects
            }
            HandshakeOutcome::Rejected => {
                warn!(
                    "Session {}: identity rejected by helper ({})",
                    self.session.id(),
                    describe_reply(code)
                );
                self.teardown(TeardownReason::HandshakeRejected)
            }
            HandshakeOutcome::Ignored => {
                warn!(
                    "Session {}: ignoring identity response, no handshake in progress",
                    self.session.id()
                );
                Vec::new()
            }
        }
    }

    fn resolve_status(&mut self, status: Status) -> Vec<Effect> {
        let update = self.store.replace_status(status);
        let mut effects = Vec::new();

        if update.changed() {
            effects.push(Effect::Emit(EngineEvent::StatusUpdated(update.current)));
        }

        if let Some(level) =
            notification_for(update.previous.status_code, update.current.status_code)
        {
            effects.push(Effect::Emit(EngineEvent::Notification {
                level,
                code: StatusCode::from(update.current.status_code),
            }));
        }

        if update.open_settings_raised {
            info!("Session {}: settings need attention", self.session.id());
            effects.push(Effect::Emit(EngineEvent::OpenSettingsRequested));
        }

        effects
    }

    /// Single teardown path. Idempotent.
    fn teardown(&mut self, reason: TeardownReason) -> Vec<Effect> {
        if self.teardown.is_some() {
            return Vec::new();
        }

        info!("Session {}: tearing down ({reason})", self.session.id());
        self.session.transition(reason.final_state());
        self.correlator.clear();
        self.teardown = Some(reason.clone());
        vec![Effect::Teardown(reason)]
    }

    fn dispatcher(&mut self) -> Dispatcher<'_> {
        Dispatcher::new(&self.session, self.correlator.as_mut())
    }

    fn send_or_log(
        &mut self,
        build: impl FnOnce(&mut Dispatcher<'_>) -> Result<Request, SessionError>,
    ) -> Vec<Effect> {
        let mut dispatcher = self.dispatcher();
        match build(&mut dispatcher) {
            Ok(request) => vec![Effect::Send(request)],
            Err(e) => {
                warn!("Session {}: request not sent: {e}", self.session.id());
                Vec::new()
            }
        }
    }
}
