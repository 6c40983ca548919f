//! Wire protocol spoken with the helper.
//!
//! Every frame is a JSON object in a WebSocket text message. Requests carry a
//! `method` verb and usually a `path`; responses echo the originating
//! `action` label (`"get status"`, `"put settings"`, ...) and acknowledge
//! with upper-case reply-code keys (`{"CREATED": 201}`).

mod request;
mod response;

pub use request::{Request, RequestKind};
pub use response::{InboundMessage, Reply};
