//! Command dispatch.
//!
//! Turns a command into a [`Request`] that is safe to put on the wire:
//! preconditions are checked here, and the request is registered with the
//! correlator before it leaves, so FIFO pairing sees the true send order.
//! A rejected command never reaches the transport and is never replayed.

use crate::correlator::Correlator;
use crate::error::SessionError;
use crate::models::Settings;
use crate::protocol::{Request, RequestKind};
use crate::session::Session;

use log::warn;

pub struct Dispatcher<'a> {
    session: &'a Session,
    correlator: &'a mut dyn Correlator,
}

impl<'a> Dispatcher<'a> {
    pub fn new(session: &'a Session, correlator: &'a mut dyn Correlator) -> Self {
        Self {
            session,
            correlator,
        }
    }

    pub fn identify(&mut self) -> Result<Request, SessionError> {
        let identity = self.session.identity().clone();
        self.dispatch(Request::Identify(identity))
    }

    pub fn get_settings(&mut self) -> Result<Request, SessionError> {
        self.dispatch(Request::GetSettings)
    }

    /// Validate and dispatch a settings write.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSettings`] for a candidate that fails
    /// [`Settings::validate`], in addition to the usual precondition errors.
    pub fn put_settings(&mut self, settings: Settings) -> Result<Request, SessionError> {
        self.check_preconditions(RequestKind::PutSettings)?;
        settings.validate()?;
        self.dispatch(Request::PutSettings(settings))
    }

    pub fn get_status(&mut self) -> Result<Request, SessionError> {
        self.dispatch(Request::GetStatus)
    }

    pub fn start(&mut self) -> Result<Request, SessionError> {
        self.dispatch(Request::Start)
    }

    pub fn pause(&mut self) -> Result<Request, SessionError> {
        self.dispatch(Request::Pause)
    }

    pub fn shutdown(&mut self) -> Result<Request, SessionError> {
        self.dispatch(Request::Shutdown)
    }

    /// Check preconditions, register with the correlator, hand back the
    /// request for sending.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotAuthenticated`] for gated commands before the
    ///   handshake completed
    /// - [`SessionError::EngineStopped`] when the transport is no longer
    ///   writable
    pub fn dispatch(&mut self, request: Request) -> Result<Request, SessionError> {
        let kind = request.kind();
        self.check_preconditions(kind)?;

        if kind.expects_reply() {
            self.correlator.on_sent(kind);
        }

        Ok(request)
    }

    fn check_preconditions(&self, kind: RequestKind) -> Result<(), SessionError> {
        if kind.requires_authentication() && !self.session.is_authenticated() {
            warn!(
                "Session {}: '{kind}' rejected, session is {}",
                self.session.id(),
                self.session.connection()
            );
            return Err(SessionError::not_authenticated(
                kind,
                self.session.connection(),
            ));
        }

        if !self.session.is_writable() {
            warn!(
                "Session {}: '{kind}' rejected, transport is not writable",
                self.session.id()
            );
            return Err(SessionError::engine_stopped(format!(
                "cannot send '{kind}' while session is {}",
                self.session.connection()
            )));
        }

        Ok(())
    }
}
