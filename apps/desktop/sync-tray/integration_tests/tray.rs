use sync_tray::launch::LaunchInfo;
use sync_tray::reporter::report_events;

use sync_client::config::ClientConfig;
use sync_client::{EngineEvent, start_session};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

// ============================================================================
// Integration tests for launch file + session + event reporter
// A minimal in-process helper stands in for the real one
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

/// Helper whose first status reports a settings-band error (code 400).
async fn start_helper_needing_settings() -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        while let Some(Ok(Message::Text(text))) = ws.next().await {
            let request: Value = serde_json::from_str(text.as_str()).unwrap();
            let _ = seen_tx.send(request.clone());

            let reply = if request.get("identity").is_some() {
                json!({"action": "post identity", "ACCEPTED": 202})
            } else if request["path"] == "settings" {
                json!({"action": "get settings", "language": "en"})
            } else if request["path"] == "status" {
                json!({"action": "get status", "synced": 0, "unsynced": 0, "code": 400})
            } else {
                break;
            };

            if ws.send(Message::text(reply.to_string())).await.is_err() {
                break;
            }
        }
    });

    (format!("ws://127.0.0.1:{port}"), seen_rx)
}

/// **VALUE**: Tests the tray path from launch file to a reported session.
///
/// **WHY THIS MATTERS**: This is the whole binary minus signal handling: the
/// identity must come from the launch file, and the headless reporter must
/// clear the open-settings request it cannot act on.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The identity sent differs from the launch file's
/// - The launch address is ignored in favour of the default endpoint
/// - The reporter never acknowledges the open-settings request
#[tokio::test]
async fn given_launch_file_when_tray_runs_session_then_identity_used_and_settings_request_cleared()
{
    // GIVEN: helper and launch file pointing at it
    let (endpoint, mut seen) = start_helper_needing_settings().await;
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        json!({"address": endpoint, "identity": "tray-launch-identity"}).to_string(),
    )
    .unwrap();

    // WHEN: tray consumes the file and starts the session with its reporter
    let launch = LaunchInfo::consume(file.path()).unwrap();
    let config = ClientConfig::default();
    let (handle, events) = start_session(&launch.endpoint(&config), launch.identity.clone(), &config)
        .await
        .unwrap();
    let mut watcher = handle.subscribe();
    tokio::spawn(report_events(handle.clone(), events));

    // THEN: helper saw the launch identity
    let identify = timeout(WAIT, seen.recv()).await.unwrap().unwrap();
    assert_eq!(identify["identity"], "tray-launch-identity");

    // THEN: settings were requested, and the reporter cleared the flag
    timeout(WAIT, async {
        loop {
            if let Ok(EngineEvent::OpenSettingsRequested) = watcher.recv().await {
                break;
            }
        }
    })
    .await
    .unwrap();

    timeout(WAIT, async {
        while handle.should_open_settings().await {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("reporter should acknowledge the settings request");

    handle.request_shutdown().await.unwrap();
}
