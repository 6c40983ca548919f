// Every teardown path stops polling and closes the connection

use crate::session_tests::helpers::{
    HelperBehaviour, MockHelper, connect, start_mock_helper, wait_for_event,
};

use sync_client::config::ClientConfig;
use sync_client::session::ConnectionState;
use sync_client::{EngineEvent, SessionHandle, TeardownReason};

use serde_json::Value;
use tokio::time::{Duration, sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn is_status_poll(request: &Value) -> bool {
    request["method"] == "get" && request["path"] == "status"
}

/// Test helper: Wait for the session to close, then check the helper hears
/// nothing more from it.
///
/// Requests already in flight when `closed()` resolves are set aside. After
/// two poll intervals the helper must have seen the connection end with no
/// status poll in between.
async fn assert_silent_after_close(
    helper: &mut MockHelper,
    handle: &SessionHandle,
) -> Option<TeardownReason> {
    let reason = timeout(WAIT, handle.closed())
        .await
        .expect("session did not close");

    while helper.received.try_recv().is_ok() {}
    sleep(ClientConfig::default().poll_interval() * 2).await;

    let late = helper.requests_until_disconnect().await;
    assert!(
        !late.iter().any(is_status_poll),
        "status polled after teardown: {late:?}"
    );
    reason
}

/// **VALUE**: A user shutdown stops the poller and closes the socket.
///
/// **WHY THIS MATTERS**: The tray exits right after asking for shutdown; a
/// poller left behind keeps writing to a helper that is going away.
///
/// **BUG THIS CATCHES**: Would catch teardown closing the transport but
/// leaving the polling task alive (or the reverse).
#[tokio::test]
async fn given_user_shutdown_when_session_closes_then_polling_and_transport_stop() {
    // GIVEN: an authenticated session
    let mut helper = start_mock_helper(HelperBehaviour::default()).await;
    let (handle, mut events) = connect(&helper).await;
    wait_for_event(&mut events, |e| matches!(e, EngineEvent::Authenticated)).await;

    // WHEN: the user shuts down
    handle.request_shutdown().await.unwrap();

    // THEN: the helper hears the shutdown and then nothing
    let reason = assert_silent_after_close(&mut helper, &handle).await;
    assert_eq!(reason, Some(TeardownReason::UserShutdown));
    assert_eq!(handle.connection_state().await, ConnectionState::Closed);
}

/// **VALUE**: A rejected identity never starts polling and closes the socket.
///
/// **BUG THIS CATCHES**: Would catch the poller firing before the handshake
/// resolves and surviving the rejection.
#[tokio::test]
async fn given_rejected_identity_when_session_closes_then_polling_and_transport_stop() {
    let mut helper = start_mock_helper(HelperBehaviour {
        reject_identity: true,
        ..HelperBehaviour::default()
    })
    .await;
    let (handle, _events) = connect(&helper).await;

    let reason = assert_silent_after_close(&mut helper, &handle).await;

    assert_eq!(reason, Some(TeardownReason::HandshakeRejected));
    assert_eq!(handle.connection_state().await, ConnectionState::Errored);
}

/// **VALUE**: Losing authorization mid-session ends polling and the socket.
///
/// **WHY THIS MATTERS**: Every further poll would be answered with the same
/// refusal, flooding the helper and the log.
///
/// **BUG THIS CATCHES**: Would catch the unauthorized path skipping the
/// shared teardown.
#[tokio::test]
async fn given_revoked_identity_when_session_closes_then_polling_and_transport_stop() {
    let mut helper = start_mock_helper(HelperBehaviour {
        revoke_on_status: true,
        ..HelperBehaviour::default()
    })
    .await;
    let (handle, _events) = connect(&helper).await;

    let reason = assert_silent_after_close(&mut helper, &handle).await;

    assert_eq!(reason, Some(TeardownReason::Unauthorized));
    assert_eq!(handle.connection_state().await, ConnectionState::Errored);
}

/// **VALUE**: A helper vanishing without a close handshake ends the session.
///
/// **BUG THIS CATCHES**: Would catch a transport error leaving the poller
/// running against a dead socket.
#[tokio::test]
async fn given_helper_vanishes_when_session_closes_then_polling_and_transport_stop() {
    let mut helper = start_mock_helper(HelperBehaviour {
        abort_after_identify: true,
        ..HelperBehaviour::default()
    })
    .await;
    let (handle, _events) = connect(&helper).await;

    let reason = assert_silent_after_close(&mut helper, &handle).await;

    assert!(
        matches!(reason, Some(TeardownReason::TransportError(_))),
        "{reason:?}"
    );
    assert_eq!(handle.connection_state().await, ConnectionState::Errored);
}
