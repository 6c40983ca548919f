//! Identity handshake state machine.

/// `Unauthenticated -> Authenticating -> Authenticated | Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Rejected,
}

/// Result of feeding an Identify response into the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Accepted,
    Rejected,
    /// No Identify was outstanding; the response is stale or duplicated.
    Ignored,
}

impl HandshakeState {
    pub(crate) fn begin(&mut self) -> bool {
        if *self == HandshakeState::Unauthenticated {
            *self = HandshakeState::Authenticating;
            true
        } else {
            false
        }
    }

    pub(crate) fn complete(&mut self, accepted: bool) -> HandshakeOutcome {
        if *self != HandshakeState::Authenticating {
            return HandshakeOutcome::Ignored;
        }

        if accepted {
            *self = HandshakeState::Authenticated;
            HandshakeOutcome::Accepted
        } else {
            *self = HandshakeState::Rejected;
            HandshakeOutcome::Rejected
        }
    }
}
