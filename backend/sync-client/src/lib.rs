pub mod config;
pub mod correlator;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod models;
pub mod protocol;
pub mod session;
pub mod status;
pub mod store;
pub mod transport;

#[cfg(test)]
mod tests;

pub use engine::{EngineEvent, SessionHandle, TeardownReason, start_session};

pub const HELPER_HOSTNAME: &str = "127.0.0.1";
pub const HELPER_DEFAULT_PORT: u16 = 9876;
pub const HELPER_DEFAULT_ENDPOINT: &str =
    const_format::concatcp!("ws://", HELPER_HOSTNAME, ":", HELPER_DEFAULT_PORT);
