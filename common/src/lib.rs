//! Shared building blocks for the sync helper client.
//!
//! This crate holds the small, dependency-light types that every other
//! workspace member leans on. Nothing here knows about sockets or sessions.
//!
//! ## Architecture
//!
//! - **common** (this crate): error locations, reply codes, secret wrappers
//! - **sync-client**: the session engine talking to the helper process
//! - **sync-tray**: the desktop-side binary wiring the engine together

pub mod error;
pub mod redacted_token;
pub mod reply_code;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_token::RedactedToken;
pub use reply_code::{ReplyCode, describe_reply};
