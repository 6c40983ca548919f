use crate::error::ProtocolError;
use crate::models::Settings;

use common::{ErrorLocation, RedactedToken};

use std::fmt;
use std::panic::Location;

use serde_json::{Value, json};

/// The closed set of requests the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Identify,
    GetSettings,
    PutSettings,
    GetStatus,
    Start,
    Pause,
    Shutdown,
}

impl RequestKind {
    /// Label the helper echoes back in the `action` field of its response.
    pub fn action_label(&self) -> &'static str {
        match self {
            RequestKind::Identify => "post identity",
            RequestKind::GetSettings => "get settings",
            RequestKind::PutSettings => "put settings",
            RequestKind::GetStatus => "get status",
            RequestKind::Start => "post start",
            RequestKind::Pause => "post pause",
            RequestKind::Shutdown => "post shutdown",
        }
    }

    /// Resolve an echoed `action` label. Older helpers acknowledged the
    /// identity handshake as `post ui_id` or `post gui_id`.
    pub fn from_action(label: &str) -> Option<RequestKind> {
        match label {
            "post identity" | "post ui_id" | "post gui_id" => Some(RequestKind::Identify),
            "get settings" => Some(RequestKind::GetSettings),
            "put settings" => Some(RequestKind::PutSettings),
            "get status" => Some(RequestKind::GetStatus),
            "post start" => Some(RequestKind::Start),
            "post pause" => Some(RequestKind::Pause),
            "post shutdown" => Some(RequestKind::Shutdown),
            _ => None,
        }
    }

    /// Shutdown is fire-and-forget; everything else gets exactly one response.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, RequestKind::Shutdown)
    }

    /// Commands gated behind a completed handshake.
    pub fn requires_authentication(&self) -> bool {
        !matches!(self, RequestKind::Identify | RequestKind::Shutdown)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action_label())
    }
}

/// A request with its payload, ready to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Identify(RedactedToken),
    GetSettings,
    PutSettings(Settings),
    GetStatus,
    Start,
    Pause,
    Shutdown,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Identify(_) => RequestKind::Identify,
            Request::GetSettings => RequestKind::GetSettings,
            Request::PutSettings(_) => RequestKind::PutSettings,
            Request::GetStatus => RequestKind::GetStatus,
            Request::Start => RequestKind::Start,
            Request::Pause => RequestKind::Pause,
            Request::Shutdown => RequestKind::Shutdown,
        }
    }

    /// Encode to the JSON text frame sent to the helper.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the settings payload does not
    /// serialize to a JSON object.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let value = match self {
            Request::Identify(identity) => json!({"method": "post", "identity": identity.as_str()}),
            Request::GetSettings => json!({"method": "get", "path": "settings"}),
            Request::GetStatus => json!({"method": "get", "path": "status"}),
            Request::Start => json!({"method": "post", "path": "start"}),
            Request::Pause => json!({"method": "post", "path": "pause"}),
            Request::Shutdown => json!({"method": "post", "path": "shutdown"}),
            Request::PutSettings(settings) => {
                let mut fields = match serde_json::to_value(settings) {
                    Ok(Value::Object(fields)) => fields,
                    Ok(other) => {
                        return Err(ProtocolError::Encode {
                            message: format!("settings encoded as {other}, expected an object"),
                            location: ErrorLocation::from(Location::caller()),
                        });
                    }
                    Err(e) => {
                        return Err(ProtocolError::Encode {
                            message: format!("Failed to encode settings: {e}"),
                            location: ErrorLocation::from(Location::caller()),
                        });
                    }
                };
                fields.insert("method".to_string(), Value::from("put"));
                fields.insert("path".to_string(), Value::from("settings"));
                Value::Object(fields)
            }
        };

        Ok(value.to_string())
    }
}
