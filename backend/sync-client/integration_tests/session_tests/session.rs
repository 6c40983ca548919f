use crate::session_tests::helpers::{
    HelperBehaviour, TEST_IDENTITY, connect, start_mock_helper, wait_for_event,
};

use sync_client::config::ClientConfig;
use sync_client::error::TransportError;
use sync_client::models::Settings;
use sync_client::session::ConnectionState;
use sync_client::{EngineEvent, TeardownReason, start_session};

use common::{RedactedToken, ReplyCode};

use tokio::net::TcpListener;
use tokio::time::{Duration, timeout};

const WAIT: Duration = Duration::from_secs(5);

/// **VALUE**: Verifies a full session against a live WebSocket helper.
///
/// **WHY THIS MATTERS**: This is the path every tray launch takes: connect,
/// identify, pull settings and status. If any hop fails the tray shows
/// nothing.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Identify is not the first frame or carries the wrong identity
/// - Acceptance does not trigger the initial settings/status reads
/// - Responses never reach the published snapshot
#[tokio::test]
async fn given_accepting_helper_when_session_starts_then_state_is_loaded() {
    // GIVEN: helper that accepts our identity
    let mut helper = start_mock_helper(HelperBehaviour::default()).await;

    // WHEN: session connects
    let (handle, mut events) = connect(&helper).await;

    // THEN: identity goes out first
    let identify = helper.expect_identify().await;
    assert_eq!(identify["method"], "post");
    assert_eq!(identify["identity"], TEST_IDENTITY);

    // THEN: settings and status are loaded
    wait_for_event(&mut events, |e| matches!(e, EngineEvent::Authenticated)).await;
    wait_for_event(&mut events, |e| {
        matches!(e, EngineEvent::SettingsUpdated(_))
    })
    .await;
    wait_for_event(&mut events, |e| matches!(e, EngineEvent::StatusUpdated(_))).await;

    assert!(handle.is_authenticated().await);
    assert_eq!(
        handle.get_settings().await.remote_container.as_deref(),
        Some("photos")
    );
    assert_eq!(handle.get_status().await.status_code, 102);
    assert!(!handle.should_open_settings().await);

    handle.request_shutdown().await.unwrap();
}

/// **VALUE**: A rejected identity ends the session in Errored.
///
/// **BUG THIS CATCHES**: Would catch a rejected session that keeps polling.
#[tokio::test]
async fn given_rejecting_helper_when_session_starts_then_torn_down_with_rejection() {
    let helper = start_mock_helper(HelperBehaviour {
        reject_identity: true,
        ..HelperBehaviour::default()
    })
    .await;

    let (handle, _events) = connect(&helper).await;

    let reason = timeout(WAIT, handle.closed()).await.unwrap();
    assert_eq!(reason, Some(TeardownReason::HandshakeRejected));
    assert_eq!(handle.connection_state().await, ConnectionState::Errored);

    // Commands after teardown are refused, not queued.
    assert!(handle.request_start().await.is_err());
}

/// **VALUE**: An accepted write is re-read from the helper.
///
/// **WHY THIS MATTERS**: The tray shows what the helper persisted, which may
/// differ from what the user typed.
///
/// **BUG THIS CATCHES**: Would catch a missing GET after CREATED.
#[tokio::test]
async fn given_authenticated_session_when_settings_written_then_refreshed_from_helper() {
    let mut helper = start_mock_helper(HelperBehaviour::default()).await;
    let (handle, mut events) = connect(&helper).await;
    wait_for_event(&mut events, |e| {
        matches!(e, EngineEvent::SettingsUpdated(_))
    })
    .await;

    let mut candidate = handle.get_settings().await;
    candidate.remote_container = Some("documents".to_string());
    handle.submit_settings(candidate).await.unwrap();

    let written = helper.expect_request("put", "settings").await;
    assert_eq!(written["container"], "documents");

    let updated = wait_for_event(&mut events, |e| {
        matches!(e, EngineEvent::SettingsUpdated(_))
    })
    .await;
    let EngineEvent::SettingsUpdated(settings) = updated else {
        unreachable!()
    };
    assert_eq!(settings.remote_container.as_deref(), Some("documents"));
    assert_eq!(
        handle.get_settings().await.remote_container.as_deref(),
        Some("documents")
    );

    handle.request_shutdown().await.unwrap();
}

#[tokio::test]
async fn given_helper_rejecting_writes_when_settings_written_then_rejection_reported() {
    let helper = start_mock_helper(HelperBehaviour {
        reject_writes: true,
        ..HelperBehaviour::default()
    })
    .await;
    let (handle, mut events) = connect(&helper).await;
    wait_for_event(&mut events, |e| {
        matches!(e, EngineEvent::SettingsUpdated(_))
    })
    .await;
    let before = handle.get_settings().await;

    handle
        .submit_settings(Settings {
            remote_container: Some("documents".to_string()),
            ..before.clone()
        })
        .await
        .unwrap();

    let rejected = wait_for_event(&mut events, |e| {
        matches!(e, EngineEvent::SettingsWriteRejected { .. })
    })
    .await;
    assert_eq!(
        rejected,
        EngineEvent::SettingsWriteRejected {
            code: Some(ReplyCode::BAD_REQUEST)
        }
    );
    assert_eq!(handle.get_settings().await, before);

    handle.request_shutdown().await.unwrap();
}

/// **VALUE**: Shutdown reaches the helper before the socket closes.
///
/// **BUG THIS CATCHES**: Would catch teardown closing the transport before
/// the final frame is flushed, leaving the helper running.
#[tokio::test]
async fn given_authenticated_session_when_shutdown_requested_then_helper_told() {
    let mut helper = start_mock_helper(HelperBehaviour::default()).await;
    let (handle, mut events) = connect(&helper).await;
    wait_for_event(&mut events, |e| matches!(e, EngineEvent::Authenticated)).await;

    handle.request_shutdown().await.unwrap();

    helper.expect_request("post", "shutdown").await;
    let reason = timeout(WAIT, handle.closed()).await.unwrap();
    assert_eq!(reason, Some(TeardownReason::UserShutdown));
    assert_eq!(handle.connection_state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn given_authenticated_session_when_start_requested_then_status_refreshed() {
    let mut helper = start_mock_helper(HelperBehaviour::default()).await;
    let (handle, mut events) = connect(&helper).await;
    wait_for_event(&mut events, |e| matches!(e, EngineEvent::Authenticated)).await;

    handle.request_start().await.unwrap();

    helper.expect_request("post", "start").await;
    helper.expect_request("get", "status").await;

    handle.request_shutdown().await.unwrap();
}

#[tokio::test]
async fn given_helper_drops_connection_when_authenticated_then_transport_closed() {
    let helper = start_mock_helper(HelperBehaviour {
        close_after_identify: true,
        ..HelperBehaviour::default()
    })
    .await;

    let (handle, mut events) = connect(&helper).await;

    let teardown =
        wait_for_event(&mut events, |e| matches!(e, EngineEvent::Teardown(_))).await;
    assert!(matches!(
        teardown,
        EngineEvent::Teardown(TeardownReason::TransportClosed)
            | EngineEvent::Teardown(TeardownReason::TransportError(_))
    ));
    assert!(handle.connection_state().await.is_terminal());
}

/// **VALUE**: Dropping every handle shuts the session down cleanly.
///
/// **BUG THIS CATCHES**: Would catch an orphaned event loop that keeps the
/// helper connection open after the tray exits.
#[tokio::test]
async fn given_all_handles_dropped_when_session_running_then_helper_told_to_shut_down() {
    let mut helper = start_mock_helper(HelperBehaviour::default()).await;
    let (handle, mut events) = connect(&helper).await;
    wait_for_event(&mut events, |e| matches!(e, EngineEvent::Authenticated)).await;

    drop(handle);

    helper.expect_request("post", "shutdown").await;
}

#[tokio::test]
async fn given_nothing_listening_when_session_starts_then_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = start_session(
        &format!("ws://127.0.0.1:{port}"),
        RedactedToken::new(TEST_IDENTITY),
        &ClientConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(TransportError::Connect { .. })));
}

#[tokio::test]
async fn given_http_endpoint_when_session_starts_then_endpoint_error() {
    let result = start_session(
        "http://127.0.0.1:9876",
        RedactedToken::new(TEST_IDENTITY),
        &ClientConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(TransportError::Endpoint { .. })));
}
