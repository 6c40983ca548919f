// Unit tests for the session engine state machine
// Drives SessionEngine directly with text frames; no sockets involved

use crate::correlator::{CorrelationStrategy, FifoCorrelator};
use crate::engine::{Effect, EngineCommand, EngineEvent, SessionEngine, TeardownReason};
use crate::error::{SessionError, TransportError};
use crate::models::{Settings, Status};
use crate::protocol::{Request, RequestKind};
use crate::session::ConnectionState;
use crate::status::{NotificationLevel, StatusCode};

use common::{RedactedToken, ReplyCode};

use serde_json::json;

const IDENTITY: &str = "tray-identity-1234";

fn new_engine() -> SessionEngine {
    SessionEngine::new(RedactedToken::new(IDENTITY), CorrelationStrategy::EchoedAction)
}

/// Engine that has sent Identify and had it accepted.
fn authenticated_engine() -> SessionEngine {
    let mut engine = new_engine();
    engine.on_open();
    engine.on_text(&json!({"action": "post identity", "ACCEPTED": 202}).to_string());
    assert!(engine.session().is_authenticated());
    engine
}

fn status_frame(synced: i64, unsynced: i64, code: i64) -> String {
    json!({"action": "get status", "synced": synced, "unsynced": unsynced, "failed": 0, "code": code})
        .to_string()
}

fn sent(effects: &[Effect]) -> Vec<RequestKind> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Send(request) => Some(request.kind()),
            _ => None,
        })
        .collect()
}

/// **VALUE**: Scenario A, the happy path from connect to first status.
///
/// **WHY THIS MATTERS**: This is every tray launch. Identify must go first,
/// and acceptance must immediately pull settings and status.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Identify not being the first frame
/// - Settings/status not requested after acceptance
/// - Store not updated from the responses
#[test]
fn given_accepting_helper_when_session_opens_then_authenticates_and_loads_state() {
    let mut engine = new_engine();

    // WHEN: transport opens
    let effects = engine.on_open();

    // THEN: identity goes out first
    assert_eq!(
        effects,
        vec![Effect::Send(Request::Identify(RedactedToken::new(IDENTITY)))]
    );
    assert_eq!(engine.session().connection(), ConnectionState::Open);

    // WHEN: helper accepts
    let effects =
        engine.on_text(&json!({"action": "post identity", "ACCEPTED": 202}).to_string());

    // THEN: authenticated, settings then status requested
    assert_eq!(
        effects,
        vec![
            Effect::Emit(EngineEvent::Authenticated),
            Effect::Send(Request::GetSettings),
            Effect::Send(Request::GetStatus),
        ]
    );
    assert_eq!(engine.session().connection(), ConnectionState::Authenticated);
    assert_eq!(engine.outstanding(), 2);

    // WHEN: settings and status arrive
    let effects = engine.on_text(
        &json!({
            "action": "get settings",
            "token": "t", "url": "https://sync.example.com", "container": "c",
            "directory": "/data", "exclude": [], "language": "en", "sync_on_start": true
        })
        .to_string(),
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::Emit(EngineEvent::SettingsUpdated(_))]
    ));

    let effects = engine.on_text(&status_frame(3, 10, 100));
    assert_eq!(
        effects,
        vec![
            Effect::Emit(EngineEvent::StatusUpdated(Status {
                synced_count: 3,
                unsynced_count: 10,
                failed_count: 0,
                status_code: 100,
                can_sync: None,
            })),
            Effect::Emit(EngineEvent::Notification {
                level: NotificationLevel::Info,
                code: StatusCode::Syncing,
            }),
        ]
    );

    // THEN: store reflects both, nothing outstanding
    assert_eq!(
        engine.store().settings().remote_url.as_deref(),
        Some("https://sync.example.com")
    );
    assert_eq!(engine.store().status().status_code, 100);
    assert_eq!(engine.outstanding(), 0);
}

/// **VALUE**: Scenario B, the helper refuses our identity.
///
/// **BUG THIS CATCHES**: Would catch a rejected session lingering in Open
/// and polling a helper that will never answer.
#[test]
fn given_rejecting_helper_when_identify_answered_then_tears_down_errored() {
    let mut engine = new_engine();
    engine.on_open();

    let effects =
        engine.on_text(&json!({"action": "post identity", "UNAUTHORIZED": 401}).to_string());

    assert_eq!(
        effects,
        vec![Effect::Teardown(TeardownReason::HandshakeRejected)]
    );
    assert_eq!(engine.session().connection(), ConnectionState::Errored);
    assert_eq!(
        engine.teardown_reason(),
        Some(&TeardownReason::HandshakeRejected)
    );
}

#[test]
fn given_settings_error_status_when_first_status_then_open_settings_raised_once() {
    let mut engine = authenticated_engine();

    let effects = engine.on_text(&status_frame(0, 0, 400));
    assert!(effects.contains(&Effect::Emit(EngineEvent::OpenSettingsRequested)));
    assert!(engine.store().flags().open_settings_requested);

    // Later statuses never raise it again, even after acknowledgement.
    engine
        .on_command(EngineCommand::AcknowledgeOpenSettings)
        .unwrap();
    let effects = engine.on_text(&status_frame(0, 0, 401));
    assert!(!effects.contains(&Effect::Emit(EngineEvent::OpenSettingsRequested)));
    assert!(!engine.store().flags().open_settings_requested);
}

/// **VALUE**: Scenario C, code 203 on the first status.
///
/// **BUG THIS CATCHES**: Would catch the settings window opening for a code
/// the literal band does not cover.
#[test]
fn given_local_directory_error_when_first_status_then_warning_without_open_settings() {
    let mut engine = authenticated_engine();

    let effects = engine.on_text(&status_frame(0, 0, 203));

    assert!(effects.contains(&Effect::Emit(EngineEvent::Notification {
        level: NotificationLevel::Warning,
        code: StatusCode::LocalDirectoryError,
    })));
    assert!(!effects.contains(&Effect::Emit(EngineEvent::OpenSettingsRequested)));
    assert!(!engine.store().flags().open_settings_requested);
}

#[test]
fn given_helper_cannot_sync_when_first_status_then_open_settings_raised() {
    let mut engine = authenticated_engine();

    let effects = engine.on_text(
        &json!({"action": "get status", "synced": 0, "unsynced": 0, "code": 0, "can_sync": false})
            .to_string(),
    );

    assert!(effects.contains(&Effect::Emit(EngineEvent::OpenSettingsRequested)));
    assert!(engine.store().flags().open_settings_requested);
}

#[test]
fn given_unchanged_status_when_polled_again_then_no_events() {
    let mut engine = authenticated_engine();
    engine.on_text(&status_frame(1, 2, 100));

    let effects = engine.on_text(&status_frame(1, 2, 100));

    assert!(effects.is_empty());
}

/// **VALUE**: Scenario D, a settings write round trip.
///
/// **WHY THIS MATTERS**: The store must reflect what the helper persisted,
/// not what we asked for.
///
/// **BUG THIS CATCHES**: Would catch writing the candidate straight into the
/// store, or skipping the refresh after CREATED.
#[test]
fn given_settings_submitted_when_created_then_refreshes_from_helper() {
    let mut engine = authenticated_engine();
    let candidate = Settings {
        remote_url: Some("https://new.example.com".to_string()),
        ..Settings::default()
    };

    let effects = engine
        .on_command(EngineCommand::SubmitSettings(candidate.clone()))
        .unwrap();
    assert_eq!(effects, vec![Effect::Send(Request::PutSettings(candidate))]);
    assert_eq!(engine.store().settings().remote_url, None);

    let effects = engine.on_text(&json!({"action": "put settings", "CREATED": 201}).to_string());
    assert_eq!(effects, vec![Effect::Send(Request::GetSettings)]);
}

#[test]
fn given_settings_submitted_when_rejected_then_store_untouched() {
    let mut engine = authenticated_engine();
    engine
        .on_command(EngineCommand::SubmitSettings(Settings::default()))
        .unwrap();

    let effects =
        engine.on_text(&json!({"action": "put settings", "BAD REQUEST": 400}).to_string());

    assert_eq!(
        effects,
        vec![Effect::Emit(EngineEvent::SettingsWriteRejected {
            code: Some(ReplyCode::BAD_REQUEST)
        })]
    );
    assert_eq!(engine.store().settings(), &Settings::default());
}

#[test]
fn given_invalid_settings_when_submitted_then_refused_before_sending() {
    let mut engine = authenticated_engine();
    let outstanding = engine.outstanding();

    let result = engine.on_command(EngineCommand::SubmitSettings(Settings {
        remote_url: Some("not a url".to_string()),
        ..Settings::default()
    }));

    assert!(matches!(result, Err(SessionError::InvalidSettings { .. })));
    assert_eq!(engine.outstanding(), outstanding);
}

#[test]
fn given_start_acknowledged_when_ok_then_status_refreshed() {
    let mut engine = authenticated_engine();

    let effects = engine.on_command(EngineCommand::Start).unwrap();
    assert_eq!(effects, vec![Effect::Send(Request::Start)]);

    let effects = engine.on_text(&json!({"action": "post start", "OK": 200}).to_string());
    assert_eq!(effects, vec![Effect::Send(Request::GetStatus)]);
}

#[test]
fn given_pause_refused_when_answered_then_command_failed_emitted() {
    let mut engine = authenticated_engine();
    engine.on_command(EngineCommand::Pause).unwrap();

    let effects =
        engine.on_text(&json!({"action": "post pause", "INTERNAL ERROR": 500}).to_string());

    assert_eq!(
        effects,
        vec![Effect::Emit(EngineEvent::CommandFailed {
            kind: RequestKind::Pause,
            code: Some(ReplyCode::INTERNAL_ERROR),
        })]
    );
}

/// **VALUE**: Gated commands before authentication are refused, not queued.
///
/// **BUG THIS CATCHES**: Would catch a Start that sneaks out before the
/// handshake and gets replayed later.
#[test]
fn given_unauthenticated_session_when_start_requested_then_not_authenticated() {
    let mut engine = new_engine();
    engine.on_open();

    let result = engine.on_command(EngineCommand::Start);

    assert!(matches!(
        result,
        Err(SessionError::NotAuthenticated {
            command: RequestKind::Start,
            state: ConnectionState::Open,
            ..
        })
    ));
    // Only Identify is outstanding.
    assert_eq!(engine.outstanding(), 1);
}

#[test]
fn given_unauthenticated_session_when_poll_ticks_then_nothing_sent() {
    let mut engine = new_engine();
    engine.on_open();

    assert!(engine.on_poll_tick().is_empty());
}

#[test]
fn given_authenticated_session_when_poll_ticks_then_status_requested() {
    let mut engine = authenticated_engine();

    assert_eq!(engine.on_poll_tick(), vec![Effect::Send(Request::GetStatus)]);
}

#[test]
fn given_status_before_authentication_when_received_then_dropped() {
    let mut engine = new_engine();
    engine.on_open();

    let effects = engine.on_text(&status_frame(1, 1, 100));

    assert!(effects.is_empty());
    assert_eq!(engine.store().status(), &Status::default());
}

/// **VALUE**: Shutdown tells the helper, then tears down exactly once.
///
/// **WHY THIS MATTERS**: The helper only exits cleanly when it receives
/// `post shutdown`; after that nothing else may be written.
///
/// **BUG THIS CATCHES**: Would catch teardown running before the final send
/// (frame never leaves) or a second teardown on repeated Quit clicks.
#[test]
fn given_authenticated_session_when_shutdown_then_sends_then_tears_down_once() {
    let mut engine = authenticated_engine();

    let effects = engine.on_command(EngineCommand::Shutdown).unwrap();

    assert_eq!(
        effects,
        vec![
            Effect::Send(Request::Shutdown),
            Effect::Teardown(TeardownReason::UserShutdown),
        ]
    );
    assert_eq!(engine.session().connection(), ConnectionState::Closed);
    assert_eq!(engine.outstanding(), 0);

    assert!(engine.on_command(EngineCommand::Shutdown).unwrap().is_empty());
    assert!(engine.on_transport_closed().is_empty());
}

#[test]
fn given_torn_down_session_when_command_sent_then_engine_stopped() {
    let mut engine = authenticated_engine();
    engine.on_transport_closed();

    let result = engine.on_command(EngineCommand::Pause);

    assert!(matches!(
        result,
        Err(SessionError::NotAuthenticated { .. }) | Err(SessionError::EngineStopped { .. })
    ));
}

/// **VALUE**: Teardown happens once no matter how many fatal signals race.
///
/// **BUG THIS CATCHES**: Would catch double close of the transport or a
/// second Teardown event confusing the collaborator.
#[test]
fn given_multiple_fatal_signals_when_handled_then_single_teardown() {
    let mut engine = authenticated_engine();

    let first = engine.on_transport_error(&TransportError::closed("reset by peer"));
    let second = engine.on_transport_closed();
    let third = engine.shutdown();

    assert!(matches!(
        first.as_slice(),
        [Effect::Teardown(TeardownReason::TransportError(_))]
    ));
    assert!(second.is_empty());
    assert!(third.is_empty());
    assert_eq!(engine.session().connection(), ConnectionState::Errored);
}

#[test]
fn given_torn_down_session_when_response_arrives_then_discarded() {
    let mut engine = authenticated_engine();
    engine.on_transport_closed();

    let effects = engine.on_text(&status_frame(9, 9, 102));

    assert!(effects.is_empty());
    assert_eq!(engine.store().status(), &Status::default());
}

#[test]
fn given_authenticated_session_when_helper_says_unauthorized_then_tears_down() {
    let mut engine = authenticated_engine();

    let effects =
        engine.on_text(&json!({"action": "get status", "UNAUTHORIZED UI": 401}).to_string());

    assert_eq!(effects, vec![Effect::Teardown(TeardownReason::Unauthorized)]);
    assert_eq!(engine.session().connection(), ConnectionState::Errored);
}

#[test]
fn given_garbage_frames_when_received_then_dropped_without_teardown() {
    let mut engine = authenticated_engine();

    assert!(engine.on_text("{not json").is_empty());
    assert!(engine.on_text(&json!({"no_action": true}).to_string()).is_empty());
    assert!(
        engine
            .on_text(&json!({"action": "get weather"}).to_string())
            .is_empty()
    );
    assert!(!engine.is_torn_down());
}

#[test]
fn given_duplicate_identify_reply_when_received_then_ignored() {
    let mut engine = authenticated_engine();

    let effects =
        engine.on_text(&json!({"action": "post identity", "ACCEPTED": 202}).to_string());

    assert!(effects.is_empty());
    assert!(engine.session().is_authenticated());
}

/// **VALUE**: FIFO pairing works with unlabelled responses, in send order.
///
/// **BUG THIS CATCHES**: Would catch the queue not being fed by the
/// dispatcher, or being fed for fire-and-forget requests.
#[test]
fn given_fifo_correlation_when_unlabelled_replies_arrive_then_paired_in_send_order() {
    let mut engine = SessionEngine::with_correlator(
        RedactedToken::new(IDENTITY),
        Box::new(FifoCorrelator::default()),
    );
    assert_eq!(engine.strategy(), CorrelationStrategy::Fifo);

    engine.on_open();
    let effects = engine.on_text(&json!({"ACCEPTED": 202}).to_string());
    assert_eq!(
        sent(&effects),
        vec![RequestKind::GetSettings, RequestKind::GetStatus]
    );

    // Settings reply first, then status.
    engine.on_text(&json!({"url": "https://fifo.example.com"}).to_string());
    engine.on_text(&json!({"synced": 2, "unsynced": 2, "code": 102}).to_string());

    assert_eq!(
        engine.store().settings().remote_url.as_deref(),
        Some("https://fifo.example.com")
    );
    assert_eq!(engine.store().status().status_code, 102);
    assert_eq!(engine.outstanding(), 0);
}

#[test]
fn given_fifo_correlation_when_label_contradicts_head_then_dropped_and_head_consumed() {
    let mut engine = SessionEngine::new(RedactedToken::new(IDENTITY), CorrelationStrategy::Fifo);
    engine.on_open();
    engine.on_text(&json!({"ACCEPTED": 202}).to_string());
    assert_eq!(engine.outstanding(), 2);

    // Head is GetSettings, message claims to be status.
    let effects = engine.on_text(&status_frame(1, 1, 100));

    assert!(effects.is_empty());
    assert_eq!(engine.outstanding(), 1);
    assert_eq!(engine.store().status(), &Status::default());
}

#[test]
fn given_engine_when_snapshot_then_reflects_connection_and_store() {
    let mut engine = authenticated_engine();
    engine.on_text(&status_frame(5, 5, 102));

    let snapshot = engine.snapshot();

    assert_eq!(snapshot.connection, ConnectionState::Authenticated);
    assert_eq!(snapshot.status.status_code, 102);
    assert!(!snapshot.flags.open_settings_requested);
}

#[test]
fn given_reasons_when_final_state_then_user_and_transport_close_are_clean() {
    assert_eq!(
        TeardownReason::UserShutdown.final_state(),
        ConnectionState::Closed
    );
    assert_eq!(
        TeardownReason::TransportClosed.final_state(),
        ConnectionState::Closed
    );
    assert_eq!(
        TeardownReason::HandshakeRejected.final_state(),
        ConnectionState::Errored
    );
    assert_eq!(
        TeardownReason::TransportError("boom".to_string()).final_state(),
        ConnectionState::Errored
    );
}
