//! Per-connection session state: connection lifecycle plus the identity
//! handshake that gates every other command.

mod connection_state;
mod handshake;

pub use connection_state::ConnectionState;
pub use handshake::{HandshakeOutcome, HandshakeState};

use common::RedactedToken;

use uuid::Uuid;

/// One connection attempt to the helper, from connect to teardown.
///
/// Written only by the handshake and lifecycle paths of the session engine;
/// collaborators see published snapshots.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    identity: RedactedToken,
    connection: ConnectionState,
    handshake: HandshakeState,
}

impl Session {
    /// Create a session for a connection attempt that is about to start.
    pub fn new(identity: RedactedToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            connection: ConnectionState::Connecting,
            handshake: HandshakeState::Unauthenticated,
        }
    }

    /// Random tag used only to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &RedactedToken {
        &self.identity
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn handshake(&self) -> HandshakeState {
        self.handshake
    }

    pub fn is_authenticated(&self) -> bool {
        self.connection == ConnectionState::Authenticated
    }

    /// Whether a frame can still be written to the transport.
    pub fn is_writable(&self) -> bool {
        matches!(
            self.connection,
            ConnectionState::Open | ConnectionState::Authenticated
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.connection.is_terminal()
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// Returns false (and leaves the state alone) for illegal moves, most
    /// importantly any attempt to leave `Closed` or `Errored`.
    pub(crate) fn transition(&mut self, next: ConnectionState) -> bool {
        if self.connection.can_transition_to(next) {
            self.connection = next;
            true
        } else {
            false
        }
    }

    /// Start the handshake. Returns false if it was already started, which
    /// keeps Identify to at most one per session.
    pub(crate) fn begin_handshake(&mut self) -> bool {
        self.handshake.begin()
    }

    /// Record the helper's verdict on our identity.
    pub(crate) fn complete_handshake(&mut self, accepted: bool) -> HandshakeOutcome {
        let outcome = self.handshake.complete(accepted);
        if outcome == HandshakeOutcome::Accepted {
            self.transition(ConnectionState::Authenticated);
        }
        outcome
    }

    /// An unauthorized signal after acceptance revokes the session.
    pub(crate) fn revoke(&mut self) {
        self.handshake = HandshakeState::Rejected;
    }
}
