//! Test helpers for session integration tests.
//!
//! This module provides a scripted stand-in for the sync helper:
//! - Listening on an ephemeral localhost port
//! - Answering requests with the helper's JSON vocabulary
//! - Forwarding every received request to the test for assertions

use sync_client::config::ClientConfig;
use sync_client::{EngineEvent, SessionHandle, start_session};

use common::RedactedToken;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Identity the tray presents in tests.
pub const TEST_IDENTITY: &str = "tray-identity-12345";

const WAIT: Duration = Duration::from_secs(5);

/// How the mock helper answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelperBehaviour {
    pub reject_identity: bool,
    pub reject_writes: bool,
    /// Drop the connection right after accepting the identity.
    pub close_after_identify: bool,
    /// Vanish without a close handshake right after accepting the identity.
    pub abort_after_identify: bool,
    /// Answer status reads with an UNAUTHORIZED reply.
    pub revoke_on_status: bool,
}

pub struct MockHelper {
    pub endpoint: String,
    pub received: mpsc::UnboundedReceiver<Value>,
    _task: JoinHandle<()>,
}

impl MockHelper {
    /// Wait for the next request matching `method` and `path`, skipping
    /// anything else (status polls, mostly).
    pub async fn expect_request(&mut self, method: &str, path: &str) -> Value {
        timeout(WAIT, async {
            loop {
                let request = self
                    .received
                    .recv()
                    .await
                    .expect("mock helper stopped before request arrived");
                if request["method"] == method && request["path"] == path {
                    return request;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for '{method} {path}'"))
    }

    /// Collect every request still queued until the helper sees the
    /// connection end. Panics if the connection is still up after the wait.
    pub async fn requests_until_disconnect(&mut self) -> Vec<Value> {
        timeout(WAIT, async {
            let mut requests = Vec::new();
            while let Some(request) = self.received.recv().await {
                requests.push(request);
            }
            requests
        })
        .await
        .expect("mock helper still connected after the session closed")
    }

    /// Wait for the identity request.
    pub async fn expect_identify(&mut self) -> Value {
        timeout(WAIT, self.received.recv())
            .await
            .expect("timed out waiting for identify")
            .expect("mock helper stopped before identify arrived")
    }
}

/// Test helper: Start a mock helper on an ephemeral port.
pub async fn start_mock_helper(behaviour: HelperBehaviour) -> MockHelper {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock helper");
    let port = listener
        .local_addr()
        .expect("Mock helper has no local address")
        .port();
    let (received_tx, received) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = accept_async(stream).await else {
            return;
        };

        let mut settings = initial_settings();

        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let request: Value =
                serde_json::from_str(text.as_str()).expect("client sent invalid JSON");
            let _ = received_tx.send(request.clone());

            let is_identify = request.get("identity").is_some();
            let is_shutdown = request["path"] == "shutdown";

            if let Some(reply) = answer(&behaviour, &request, &mut settings) {
                if ws.send(Message::text(reply.to_string())).await.is_err() {
                    break;
                }
            }

            if is_identify && behaviour.abort_after_identify {
                return;
            }

            if is_shutdown || (is_identify && behaviour.close_after_identify) {
                let _ = ws.close(None).await;
                break;
            }
        }
    });

    MockHelper {
        endpoint: format!("ws://127.0.0.1:{port}"),
        received,
        _task: task,
    }
}

/// Test helper: Connect a session to the mock helper.
pub async fn connect(helper: &MockHelper) -> (SessionHandle, broadcast::Receiver<EngineEvent>) {
    start_session(
        &helper.endpoint,
        RedactedToken::new(TEST_IDENTITY),
        &ClientConfig::default(),
    )
    .await
    .expect("Failed to connect to mock helper")
}

/// Test helper: Wait for the first event matching `predicate`.
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<EngineEvent>,
    predicate: impl Fn(&EngineEvent) -> bool,
) -> EngineEvent {
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("event channel closed before expected event")
                }
            }
        }
    })
    .await
    .expect("timed out waiting for engine event")
}

fn initial_settings() -> Map<String, Value> {
    let Value::Object(settings) = json!({
        "token": "remote-token",
        "url": "https://sync.example.com",
        "container": "photos",
        "directory": "/home/tester/photos",
        "exclude": ["*.tmp"],
        "language": "en",
        "sync_on_start": true
    }) else {
        unreachable!()
    };
    settings
}

fn answer(
    behaviour: &HelperBehaviour,
    request: &Value,
    settings: &mut Map<String, Value>,
) -> Option<Value> {
    if request.get("identity").is_some() {
        return Some(if behaviour.reject_identity {
            json!({"action": "post identity", "UNAUTHORIZED": 401})
        } else {
            json!({"action": "post identity", "ACCEPTED": 202})
        });
    }

    let method = request["method"].as_str().unwrap_or_default();
    let path = request["path"].as_str().unwrap_or_default();

    match (method, path) {
        ("get", "settings") => {
            let mut reply = settings.clone();
            reply.insert("action".to_string(), json!("get settings"));
            Some(Value::Object(reply))
        }
        ("get", "status") if behaviour.revoke_on_status => {
            Some(json!({"action": "get status", "UNAUTHORIZED UI": 401}))
        }
        ("get", "status") => Some(json!({
            "action": "get status",
            "synced": 3, "unsynced": 10, "failed": 0, "code": 102
        })),
        ("put", "settings") if behaviour.reject_writes => {
            Some(json!({"action": "put settings", "BAD REQUEST": 400}))
        }
        ("put", "settings") => {
            if let Value::Object(fields) = request {
                for (key, value) in fields {
                    if key != "method" && key != "path" {
                        settings.insert(key.clone(), value.clone());
                    }
                }
            }
            Some(json!({"action": "put settings", "CREATED": 201}))
        }
        ("post", "start") => Some(json!({"action": "post start", "OK": 200})),
        ("post", "pause") => Some(json!({"action": "post pause", "OK": 200})),
        _ => None,
    }
}
