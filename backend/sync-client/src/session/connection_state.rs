//! Connection lifecycle tracking.

use std::fmt;

/// Where a session is in its single pass from connect to teardown.
///
/// There is no path back out of `Closed` or `Errored`: the engine never
/// reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Authenticated,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }

    pub(crate) fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        match (self, next) {
            (Closed | Errored, _) => false,
            (Connecting, Open) => true,
            (Open, Authenticated) => true,
            (_, Closed | Errored) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Authenticated => "authenticated",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        };
        write!(f, "{name}")
    }
}
