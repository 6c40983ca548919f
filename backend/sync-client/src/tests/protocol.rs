// Unit tests for request encoding and response decoding

use crate::error::ProtocolError;
use crate::models::{Settings, Status};
use crate::protocol::{InboundMessage, Reply, Request, RequestKind};

use common::{RedactedToken, ReplyCode};

use serde_json::{Value, json};

fn encoded(request: &Request) -> Value {
    let text = request.encode().expect("request should encode");
    serde_json::from_str(&text).expect("encoded request should be JSON")
}

fn inbound(value: Value) -> InboundMessage {
    InboundMessage::parse(&value.to_string()).expect("test message should parse")
}

/// **VALUE**: Verifies every request shape on the wire.
///
/// **WHY THIS MATTERS**: The helper routes on `method` + `path`; a wrong key
/// silently turns a command into a no-op.
///
/// **BUG THIS CATCHES**: Would catch a swapped verb (post vs put) or a
/// missing `path`.
#[test]
fn given_each_request_when_encoded_then_matches_wire_shape() {
    assert_eq!(
        encoded(&Request::Identify(RedactedToken::new("abc"))),
        json!({"method": "post", "identity": "abc"})
    );
    assert_eq!(
        encoded(&Request::GetSettings),
        json!({"method": "get", "path": "settings"})
    );
    assert_eq!(
        encoded(&Request::GetStatus),
        json!({"method": "get", "path": "status"})
    );
    assert_eq!(
        encoded(&Request::Start),
        json!({"method": "post", "path": "start"})
    );
    assert_eq!(
        encoded(&Request::Pause),
        json!({"method": "post", "path": "pause"})
    );
    assert_eq!(
        encoded(&Request::Shutdown),
        json!({"method": "post", "path": "shutdown"})
    );
}

#[test]
fn given_settings_when_put_encoded_then_fields_sit_beside_method_and_path() {
    let settings = Settings {
        credential_token: Some("secret".to_string()),
        remote_url: Some("https://sync.example.com".to_string()),
        remote_container: Some("bucket".to_string()),
        local_directory: Some("/home/me/sync".to_string()),
        exclude_patterns: ["*.tmp".to_string()].into(),
        ..Settings::default()
    };

    let value = encoded(&Request::PutSettings(settings));

    assert_eq!(value["method"], "put");
    assert_eq!(value["path"], "settings");
    assert_eq!(value["token"], "secret");
    assert_eq!(value["url"], "https://sync.example.com");
    assert_eq!(value["container"], "bucket");
    assert_eq!(value["directory"], "/home/me/sync");
    assert_eq!(value["exclude"], json!(["*.tmp"]));
    assert_eq!(value["language"], "en");
    assert_eq!(value["sync_on_start"], true);
}

#[test]
fn given_labels_when_from_action_then_resolves_current_and_legacy_names() {
    for kind in [
        RequestKind::Identify,
        RequestKind::GetSettings,
        RequestKind::PutSettings,
        RequestKind::GetStatus,
        RequestKind::Start,
        RequestKind::Pause,
        RequestKind::Shutdown,
    ] {
        assert_eq!(RequestKind::from_action(kind.action_label()), Some(kind));
    }
    assert_eq!(
        RequestKind::from_action("post ui_id"),
        Some(RequestKind::Identify)
    );
    assert_eq!(
        RequestKind::from_action("post gui_id"),
        Some(RequestKind::Identify)
    );
    assert_eq!(RequestKind::from_action("delete everything"), None);
}

#[test]
fn given_request_kinds_when_classified_then_only_shutdown_is_fire_and_forget() {
    assert!(!RequestKind::Shutdown.expects_reply());
    assert!(!RequestKind::Shutdown.requires_authentication());
    assert!(!RequestKind::Identify.requires_authentication());
    assert!(RequestKind::Identify.expects_reply());
    assert!(RequestKind::Start.requires_authentication());
}

#[test]
fn given_non_object_json_when_parsed_then_malformed() {
    assert!(matches!(
        InboundMessage::parse("[1, 2, 3]"),
        Err(ProtocolError::Malformed { .. })
    ));
    assert!(matches!(
        InboundMessage::parse("not json"),
        Err(ProtocolError::Malformed { .. })
    ));
}

#[test]
fn given_identify_replies_when_decoded_then_only_accepted_202_authenticates() {
    let accepted = inbound(json!({"action": "post identity", "ACCEPTED": 202}));
    assert_eq!(
        Reply::decode(RequestKind::Identify, &accepted).unwrap(),
        Reply::Identify {
            accepted: true,
            code: Some(ReplyCode::ACCEPTED)
        }
    );

    let rejected = inbound(json!({"action": "post identity", "UNAUTHORIZED": 401}));
    assert_eq!(
        Reply::decode(RequestKind::Identify, &rejected).unwrap(),
        Reply::Identify {
            accepted: false,
            code: Some(ReplyCode::UNAUTHORIZED)
        }
    );

    let wrong_value = inbound(json!({"action": "post identity", "ACCEPTED": 200}));
    assert!(matches!(
        Reply::decode(RequestKind::Identify, &wrong_value).unwrap(),
        Reply::Identify {
            accepted: false,
            ..
        }
    ));
}

#[test]
fn given_put_settings_replies_when_decoded_then_created_required() {
    let created = inbound(json!({"action": "put settings", "CREATED": 201}));
    assert!(matches!(
        Reply::decode(RequestKind::PutSettings, &created).unwrap(),
        Reply::SettingsWritten { created: true, .. }
    ));

    let bad = inbound(json!({"action": "put settings", "BAD REQUEST": 400}));
    assert_eq!(
        Reply::decode(RequestKind::PutSettings, &bad).unwrap(),
        Reply::SettingsWritten {
            created: false,
            code: Some(ReplyCode::BAD_REQUEST)
        }
    );
}

#[test]
fn given_control_replies_when_decoded_then_ok_required() {
    let ok = inbound(json!({"action": "post pause", "OK": 200}));
    assert_eq!(
        Reply::decode(RequestKind::Pause, &ok).unwrap(),
        Reply::Control {
            kind: RequestKind::Pause,
            ok: true,
            code: Some(ReplyCode::OK)
        }
    );

    let refused = inbound(json!({"action": "post start", "INTERNAL ERROR": 500}));
    assert!(matches!(
        Reply::decode(RequestKind::Start, &refused).unwrap(),
        Reply::Control { ok: false, .. }
    ));
}

/// **VALUE**: Verifies status decoding including the optional fields.
///
/// **BUG THIS CATCHES**: Would catch a missing default for `failed` (older
/// helpers omit it) or a status accepted without its code.
#[test]
fn given_status_payloads_when_decoded_then_required_fields_enforced() {
    let full = inbound(json!({
        "action": "get status",
        "synced": 4, "unsynced": 9, "failed": 2, "code": 100, "can_sync": true
    }));
    assert_eq!(
        Reply::decode(RequestKind::GetStatus, &full).unwrap(),
        Reply::Status(Status {
            synced_count: 4,
            unsynced_count: 9,
            failed_count: 2,
            status_code: 100,
            can_sync: Some(true),
        })
    );

    let no_failed = inbound(json!({"action": "get status", "synced": 1, "unsynced": 1, "code": 0}));
    assert!(matches!(
        Reply::decode(RequestKind::GetStatus, &no_failed).unwrap(),
        Reply::Status(Status {
            failed_count: 0,
            can_sync: None,
            ..
        })
    ));

    let no_code = inbound(json!({"action": "get status", "synced": 1, "unsynced": 1}));
    assert!(matches!(
        Reply::decode(RequestKind::GetStatus, &no_code),
        Err(ProtocolError::Malformed { .. })
    ));
}

#[test]
fn given_error_code_on_data_reply_when_decoded_then_rejected() {
    let message = inbound(json!({"action": "get settings", "INTERNAL ERROR": 500}));
    assert!(Reply::decode(RequestKind::GetSettings, &message).is_err());
}

#[test]
fn given_settings_reply_when_decoded_then_action_key_ignored() {
    let message = inbound(json!({
        "action": "get settings",
        "token": "t", "url": "https://x.example", "container": "c", "directory": "/d",
        "exclude": ["*.log", "*.tmp"], "language": "fr", "sync_on_start": false
    }));

    let Reply::Settings(settings) = Reply::decode(RequestKind::GetSettings, &message).unwrap()
    else {
        panic!("expected settings reply");
    };

    assert_eq!(settings.credential_token.as_deref(), Some("t"));
    assert_eq!(settings.language, "fr");
    assert!(!settings.sync_on_start);
    assert_eq!(settings.exclude_patterns.len(), 2);
}

#[test]
fn given_unauthorized_variants_when_checked_then_detected() {
    assert!(inbound(json!({"UNAUTHORIZED": 401})).is_unauthorized());
    assert!(inbound(json!({"action": "get status", "UNAUTHORIZED UI": 401})).is_unauthorized());
    assert!(!inbound(json!({"UNAUTHORIZED": 400})).is_unauthorized());
    assert!(!inbound(json!({"action": "get status", "OK": 200})).is_unauthorized());
}

#[test]
fn given_shutdown_reply_when_decoded_then_unexpected() {
    let message = inbound(json!({"action": "post shutdown", "OK": 200}));
    assert!(matches!(
        Reply::decode(RequestKind::Shutdown, &message),
        Err(ProtocolError::UnexpectedAction { .. })
    ));
}
