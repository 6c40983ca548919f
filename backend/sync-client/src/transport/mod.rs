//! WebSocket transport to the helper.
//!
//! A thin, ordered, message-oriented duplex channel: text frames out, text
//! frames in. The transport has no opinion about what the frames mean and
//! keeps no state beyond open/closed.

use crate::error::TransportError;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type HelperStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on waiting for the helper to acknowledge a close.
pub const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// What the read half produced.
#[derive(Debug)]
pub enum TransportEvent {
    Text(String),
    Closed,
    Error(TransportError),
}

pub struct WsTransport {
    endpoint: Url,
    write: SplitSink<HelperStream, Message>,
    read: SplitStream<HelperStream>,
    open: bool,
}

impl WsTransport {
    /// Connect to the helper's endpoint.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Endpoint`] if `endpoint` is not a `ws://` or
    ///   `wss://` URL
    /// - [`TransportError::Connect`] if the WebSocket upgrade fails
    pub async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = parse_endpoint(endpoint)?;

        let (ws_stream, _) = connect_async(endpoint.as_str()).await.map_err(|e| {
            TransportError::Connect {
                message: format!("Failed to connect to helper at {endpoint}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        info!("Connected to helper at {endpoint}");
        let (write, read) = ws_stream.split();

        Ok(Self {
            endpoint,
            write,
            read,
            open: true,
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Write one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] after [`close`](Self::close), or
    /// [`TransportError::Send`] if the socket write fails.
    pub async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::closed("transport already closed"));
        }

        self.write
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::send(&e))
    }

    /// Wait for the next text frame. Binary frames and control frames are
    /// skipped; a close frame or end of stream is reported as `Closed`.
    pub async fn next_event(&mut self) -> TransportEvent {
        while let Some(msg) = self.read.next().await {
            match msg {
                Ok(Message::Text(text)) => return TransportEvent::Text(text.as_str().to_owned()),
                Ok(Message::Binary(_)) => {
                    warn!("Helper sent a binary frame, ignoring");
                }
                Ok(Message::Close(frame)) => {
                    debug!("Helper closed the connection: {frame:?}");
                    return TransportEvent::Closed;
                }
                Ok(_) => {}
                Err(e) => return TransportEvent::Error(TransportError::read(&e)),
            }
        }

        TransportEvent::Closed
    }

    /// Close the channel. Only the first call touches the socket.
    ///
    /// Sends a close frame, then reads until the helper acknowledges it (or
    /// [`CLOSE_DRAIN_TIMEOUT`] passes). Dropping the socket with replies
    /// still unread resets the connection, and the helper would lose frames
    /// it had not read yet, the final Shutdown among them.
    pub async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        if let Err(e) = self.write.close().await {
            debug!("Error while closing helper connection: {e}");
        }
        self.drain_until_closed().await;
        info!("Connection to helper at {} closed", self.endpoint);
    }

    /// Discard inbound frames until the close handshake finishes.
    async fn drain_until_closed(&mut self) {
        let read = &mut self.read;
        let drained = timeout(CLOSE_DRAIN_TIMEOUT, async move {
            let mut discarded = 0usize;
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => discarded += 1,
                }
            }
            discarded
        })
        .await;

        match drained {
            Ok(0) => {}
            Ok(discarded) => debug!("Discarded {discarded} frame(s) received while closing"),
            Err(_) => warn!(
                "Helper at {} did not acknowledge close within {CLOSE_DRAIN_TIMEOUT:?}",
                self.endpoint
            ),
        }
    }
}

/// Accept only WebSocket URLs.
///
/// # Errors
///
/// Returns [`TransportError::Endpoint`] for unparsable URLs or other schemes.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, TransportError> {
    let url = Url::parse(endpoint)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::endpoint(format!(
            "unsupported scheme '{other}' in {endpoint}, expected ws:// or wss://"
        ))),
    }
}
