//! Reply codes the helper attaches to its acknowledgements.
//!
//! The helper reuses HTTP-style numbers under upper-case keys
//! (`{"ACCEPTED": 202}`, `{"CREATED": 201}`), so the classification
//! mirrors HTTP status classes.

/// Numeric reply code carried by a helper acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyCode(pub u16);

impl ReplyCode {
    pub const OK: ReplyCode = ReplyCode(200);
    pub const CREATED: ReplyCode = ReplyCode(201);
    pub const ACCEPTED: ReplyCode = ReplyCode(202);
    pub const BAD_REQUEST: ReplyCode = ReplyCode(400);
    pub const UNAUTHORIZED: ReplyCode = ReplyCode(401);
    pub const INTERNAL_ERROR: ReplyCode = ReplyCode(500);

    /// 2xx replies.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 4xx replies (the request itself was refused).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx replies (the helper failed while handling the request).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Which side a reply code blames, for log lines.
    pub fn blame(&self) -> &'static str {
        if self.is_success() {
            "accepted"
        } else if self.is_client_error() {
            "refused"
        } else if self.is_server_error() {
            "helper failure"
        } else {
            "unrecognised"
        }
    }
}

/// Log-friendly rendering of an optional reply code.
pub fn describe_reply(code: Option<ReplyCode>) -> String {
    match code {
        Some(code) => format!("{code} {}", code.blame()),
        None => "no reply code".to_string(),
    }
}

impl From<u16> for ReplyCode {
    fn from(code: u16) -> Self {
        ReplyCode(code)
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
