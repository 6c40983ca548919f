//! Lifecycle controller: the session's single event loop.
//!
//! Owns the transport, the polling task and the [`SessionEngine`]. Inbound
//! frames, poll ticks and collaborator commands are handled one at a time,
//! so neither the store nor the pending queue is ever touched concurrently.
//! Every fatal condition funnels into the engine's single teardown effect,
//! which is where polling is cancelled and the transport closed.

use crate::config::ClientConfig;
use crate::engine::handle::{CommandEnvelope, SessionHandle};
use crate::engine::machine::{Effect, EngineEvent, SessionEngine, TeardownReason};
use crate::engine::polling::PollingTask;
use crate::error::TransportError;
use crate::protocol::Request;
use crate::store::StoreSnapshot;
use crate::transport::{TransportEvent, WsTransport};

use common::RedactedToken;

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{RwLock, broadcast, mpsc, watch};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Connect to the helper and run a session in the background.
///
/// Returns the collaborator handle and a receiver that sees every engine
/// event from the first one on (later subscribers use
/// [`SessionHandle::subscribe`]).
///
/// # Errors
///
/// Returns [`TransportError`] if the endpoint is invalid or the connection
/// cannot be established. No session task is started in that case.
pub async fn start_session(
    endpoint: &str,
    identity: RedactedToken,
    config: &ClientConfig,
) -> Result<(SessionHandle, broadcast::Receiver<EngineEvent>), TransportError> {
    let engine = SessionEngine::new(identity, config.correlation);
    info!(
        "Session {}: connecting to {endpoint} (correlation: {:?})",
        engine.session().id(),
        engine.strategy()
    );

    let transport = WsTransport::connect(endpoint).await.map_err(|e| {
        error!("Session {}: connect failed: {e}", engine.session().id());
        e
    })?;

    let snapshot = Arc::new(RwLock::new(engine.snapshot()));
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (closed_tx, closed_rx) = watch::channel(None);

    let (polling, ticks) = PollingTask::start(config.poll_interval());

    let controller = LifecycleController {
        engine,
        transport,
        polling,
        ticks,
        snapshot: Arc::clone(&snapshot),
        events: event_tx.clone(),
        closed: closed_tx,
    };
    tokio::spawn(controller.run(command_rx));

    Ok((
        SessionHandle::new(command_tx, snapshot, event_tx, closed_rx),
        event_rx,
    ))
}

enum LoopEvent {
    Inbound(TransportEvent),
    Tick,
    Command(Option<CommandEnvelope>),
}

struct LifecycleController {
    engine: SessionEngine,
    transport: WsTransport,
    polling: PollingTask,
    ticks: mpsc::Receiver<()>,
    snapshot: Arc<RwLock<StoreSnapshot>>,
    events: broadcast::Sender<EngineEvent>,
    closed: watch::Sender<Option<TeardownReason>>,
}

impl LifecycleController {
    async fn run(mut self, mut commands: mpsc::Receiver<CommandEnvelope>) {
        let effects = self.engine.on_open();
        self.apply(effects).await;
        self.publish().await;

        while !self.engine.is_torn_down() {
            let event = tokio::select! {
                inbound = self.transport.next_event() => LoopEvent::Inbound(inbound),
                Some(()) = self.ticks.recv() => LoopEvent::Tick,
                command = commands.recv() => LoopEvent::Command(command),
            };

            let effects = match event {
                LoopEvent::Inbound(TransportEvent::Text(text)) => {
                    debug!("Session {}: recv {text}", self.engine.session().id());
                    self.engine.on_text(&text)
                }
                LoopEvent::Inbound(TransportEvent::Closed) => self.engine.on_transport_closed(),
                LoopEvent::Inbound(TransportEvent::Error(e)) => {
                    error!("Session {}: transport error: {e}", self.engine.session().id());
                    self.engine.on_transport_error(&e)
                }
                LoopEvent::Tick => self.engine.on_poll_tick(),
                LoopEvent::Command(Some(envelope)) => {
                    let (command, reply) = envelope.into_parts();
                    match self.engine.on_command(command) {
                        Ok(effects) => {
                            let _ = reply.send(Ok(()));
                            effects
                        }
                        Err(e) => {
                            warn!("Session {}: command refused: {e}", self.engine.session().id());
                            let _ = reply.send(Err(e));
                            Vec::new()
                        }
                    }
                }
                LoopEvent::Command(None) => {
                    info!(
                        "Session {}: all handles dropped, shutting down",
                        self.engine.session().id()
                    );
                    self.engine.shutdown()
                }
            };

            self.apply(effects).await;
            self.publish().await;
        }

        debug!("Session {}: event loop finished", self.engine.session().id());
    }

    /// Carry out effects in order. A failed send feeds the transport error
    /// back into the engine ahead of anything still queued.
    async fn apply(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Send(request) => {
                    if let Err(e) = self.send(&request).await {
                        error!("Session {}: {e}", self.engine.session().id());
                        for follow_up in self.engine.on_transport_error(&e).into_iter().rev() {
                            queue.push_front(follow_up);
                        }
                    }
                }
                Effect::Emit(event) => {
                    // Readers reacting to the event must see matching state.
                    self.publish().await;
                    let _ = self.events.send(event);
                }
                Effect::Teardown(reason) => self.teardown(reason).await,
            }
        }
    }

    async fn send(&mut self, request: &Request) -> Result<(), TransportError> {
        if !self.transport.is_open() {
            debug!(
                "Session {}: not sending '{}', transport closed",
                self.engine.session().id(),
                request.kind()
            );
            return Ok(());
        }

        let frame = match request.encode() {
            Ok(frame) => frame,
            Err(e) => {
                error!(
                    "Session {}: could not encode '{}': {e}",
                    self.engine.session().id(),
                    request.kind()
                );
                return Ok(());
            }
        };

        debug!("Session {}: send '{}'", self.engine.session().id(), request.kind());
        self.transport.send_text(frame).await
    }

    async fn teardown(&mut self, reason: TeardownReason) {
        self.polling.cancel();
        self.transport.close().await;
        self.publish().await;

        let _ = self.events.send(EngineEvent::Teardown(reason.clone()));
        let _ = self.closed.send(Some(reason));
    }

    async fn publish(&self) {
        let snapshot = self.engine.snapshot();
        let mut shared = self.snapshot.write().await;
        if *shared != snapshot {
            *shared = snapshot;
        }
    }
}
