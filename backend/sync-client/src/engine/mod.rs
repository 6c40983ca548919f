//! The session engine.
//!
//! # Architecture
//!
//! - [`SessionEngine`] is a synchronous state machine. Each input (transport
//!   opened, text frame, poll tick, collaborator command, transport failure)
//!   mutates session + store + correlator and returns a list of [`Effect`]s.
//! - The lifecycle controller owns the transport, the polling task and the
//!   engine, and runs a single event loop that feeds inputs in and carries
//!   effects out, one event at a time.
//! - [`SessionHandle`] is what collaborators hold: read-only snapshots plus
//!   commands sent to the loop over an mpsc channel (actor pattern).

mod handle;
mod lifecycle;
mod machine;
mod polling;

pub use handle::SessionHandle;
pub use lifecycle::start_session;
pub use machine::{Effect, EngineCommand, EngineEvent, SessionEngine, TeardownReason};
pub use polling::PollingTask;
