use crate::error::ProtocolError;
use crate::models::{Settings, Status};
use crate::protocol::RequestKind;

use common::ReplyCode;

use serde_json::{Map, Value};

/// A decoded inbound frame: a JSON object whose meaning is not yet known.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    fields: Map<String, Value>,
}

impl InboundMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] for invalid JSON or JSON that is
    /// not an object.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ProtocolError::malformed(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The echoed action label, if present and a string.
    pub fn action(&self) -> Option<&str> {
        self.fields.get("action").and_then(Value::as_str)
    }

    /// Code stored under an exact reply key, e.g. `code_under("CREATED")`.
    pub fn code_under(&self, key: &str) -> Option<ReplyCode> {
        self.fields.get(key).and_then(as_reply_code)
    }

    /// First upper-case reply key carrying a numeric code (`OK`, `CREATED`,
    /// `BAD REQUEST`, `UNAUTHORIZED UI`, ...).
    pub fn reply_code(&self) -> Option<ReplyCode> {
        self.fields
            .iter()
            .filter(|(key, _)| is_reply_key(key))
            .find_map(|(_, value)| as_reply_code(value))
    }

    /// The helper's "your token does not work" signal, under any of the
    /// spellings it has used (`UNAUTHORIZED`, `UNAUTHORIZED UI`).
    pub fn is_unauthorized(&self) -> bool {
        self.fields.iter().any(|(key, value)| {
            key.starts_with("UNAUTHORIZED") && as_reply_code(value) == Some(ReplyCode::UNAUTHORIZED)
        })
    }
}

/// A response interpreted against the request kind it answers.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Identify {
        accepted: bool,
        code: Option<ReplyCode>,
    },
    Control {
        kind: RequestKind,
        ok: bool,
        code: Option<ReplyCode>,
    },
    Settings(Settings),
    SettingsWritten {
        created: bool,
        code: Option<ReplyCode>,
    },
    Status(Status),
}

impl Reply {
    /// Interpret `message` as the response to a request of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the payload is missing required fields,
    /// carries an error code instead of data, or answers a request that never
    /// gets a response.
    pub fn decode(kind: RequestKind, message: &InboundMessage) -> Result<Reply, ProtocolError> {
        match kind {
            RequestKind::Identify => Ok(Reply::Identify {
                accepted: message.code_under("ACCEPTED") == Some(ReplyCode::ACCEPTED),
                code: message.reply_code(),
            }),
            RequestKind::Start | RequestKind::Pause => Ok(Reply::Control {
                kind,
                ok: message.code_under("OK") == Some(ReplyCode::OK),
                code: message.reply_code(),
            }),
            RequestKind::PutSettings => Ok(Reply::SettingsWritten {
                created: message.code_under("CREATED") == Some(ReplyCode::CREATED),
                code: message.reply_code(),
            }),
            RequestKind::GetSettings => {
                reject_error_reply(kind, message)?;
                let settings = serde_json::from_value(Value::Object(message.fields.clone()))?;
                Ok(Reply::Settings(settings))
            }
            RequestKind::GetStatus => {
                reject_error_reply(kind, message)?;
                decode_status(message).map(Reply::Status)
            }
            RequestKind::Shutdown => Err(ProtocolError::unexpected_action(kind.action_label())),
        }
    }
}

fn decode_status(message: &InboundMessage) -> Result<Status, ProtocolError> {
    let fields = message.fields();
    let required = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| ProtocolError::malformed(format!("status is missing integer '{key}'")))
    };

    Ok(Status {
        synced_count: required("synced")?,
        unsynced_count: required("unsynced")?,
        failed_count: fields.get("failed").and_then(Value::as_i64).unwrap_or(0),
        status_code: required("code")?,
        can_sync: fields.get("can_sync").and_then(Value::as_bool),
    })
}

/// Data responses must not carry a failing reply code.
fn reject_error_reply(kind: RequestKind, message: &InboundMessage) -> Result<(), ProtocolError> {
    match message.reply_code() {
        Some(code) if !code.is_success() => Err(ProtocolError::malformed(format!(
            "{kind} answered with error code {code}"
        ))),
        _ => Ok(()),
    }
}

fn is_reply_key(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_uppercase())
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '_')
}

fn as_reply_code(value: &Value) -> Option<ReplyCode> {
    value
        .as_u64()
        .and_then(|code| u16::try_from(code).ok())
        .map(ReplyCode)
}
