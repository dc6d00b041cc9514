//! WebSocket Connection Management - Client side of the realtime link
//!
//! The connection is split in two halves, each driven by its own task:
//! - `listen_ws` decodes server frames and forwards them as `SocketEvent`s
//! - `write_ws` serializes outgoing commands and keeps the link alive

use crate::core::{ChatError, Session};
use crate::dtos::{WsCommandDTO, WsEventDTO};
use crate::ws::{KEEPALIVE_INTERVAL_SECS, RealtimeTransport, SocketEvent};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Signals consumed by the write task
pub enum InternalSignal {
    Command(WsCommandDTO),
    Shutdown,
}

/// The server may push a single event or a batch of them in one frame
#[derive(Deserialize)]
#[serde(untagged)]
enum Frame {
    Batch(Vec<WsEventDTO>),
    Single(WsEventDTO),
}

/// Decodes a text frame into the events it carries
pub fn decode_frame(text: &str) -> Result<Vec<SocketEvent>, serde_json::Error> {
    Ok(match serde_json::from_str::<Frame>(text)? {
        Frame::Batch(events) => events.into_iter().map(SocketEvent::from).collect(),
        Frame::Single(event) => vec![SocketEvent::from(event)],
    })
}

struct Link {
    internal_tx: UnboundedSender<InternalSignal>,
    connected: Arc<AtomicBool>,
    listen_task: JoinHandle<()>,
}

/// `RealtimeTransport` over a WebSocket authenticated with the session's
/// bearer token
pub struct WsTransport {
    url: Url,
    session: Arc<Session>,
    link: Mutex<Option<Link>>,
}

impl WsTransport {
    pub fn new(url: Url, session: Arc<Session>) -> Self {
        Self {
            url,
            session,
            link: Mutex::new(None),
        }
    }

    async fn open(&self) -> Result<WsStream, ChatError> {
        let token = self.session.bearer()?;
        let mut request = self.url.as_str().into_client_request()?;
        let header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ChatError::Authentication("Token is not a valid header value".to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, header);

        let (stream, response) = connect_async(request).await?;
        debug!(status = response.status().as_u16(), "WebSocket handshake completed");
        Ok(stream)
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        let link = self.link.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(link) = link {
            let _ = link.internal_tx.send(InternalSignal::Shutdown);
            link.listen_task.abort();
        }
    }
}

impl RealtimeTransport for WsTransport {
    #[instrument(skip(self, events), fields(url = %self.url))]
    async fn connect(&self, events: UnboundedSender<SocketEvent>) -> Result<(), ChatError> {
        if self.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        let stream = self.open().await?;
        info!("WebSocket connection established");

        let (ws_tx, ws_rx) = stream.split();
        let (internal_tx, internal_rx) = unbounded_channel::<InternalSignal>();
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(write_ws(ws_tx, internal_rx, connected.clone()));
        let listen_task = tokio::spawn(listen_ws(ws_rx, events, internal_tx.clone(), connected.clone()));

        let previous = self
            .link
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(Link {
                internal_tx,
                connected,
                listen_task,
            });
        if let Some(stale) = previous {
            stale.listen_task.abort();
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn disconnect(&self) {
        let link = self.link.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(link) = link {
            info!("Closing WebSocket connection");
            link.connected.store(false, Ordering::SeqCst);
            let _ = link.internal_tx.send(InternalSignal::Shutdown);
            // dropping the listener releases the event sender, which stops the router
            link.listen_task.abort();
        }
    }

    fn is_connected(&self) -> bool {
        self.link
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|l| l.connected.load(Ordering::SeqCst))
    }

    fn send(&self, command: WsCommandDTO) -> Result<(), ChatError> {
        let guard = self.link.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(link) if link.connected.load(Ordering::SeqCst) => link
                .internal_tx
                .send(InternalSignal::Command(command))
                .map_err(|_| ChatError::network("WebSocket writer has stopped")),
            _ => Err(ChatError::network("WebSocket is not connected")),
        }
    }
}

#[instrument(skip_all)]
async fn write_ws(
    mut websocket_tx: SplitSink<WsStream, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    connected: Arc<AtomicBool>,
) {
    debug!("Write task started");
    let mut keepalive = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECS));
    keepalive.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Command(command)) => {
                        let json = match serde_json::to_string(&command) {
                            Ok(json) => json,
                            Err(e) => {
                                error!("Failed to serialize command: {:?}", e);
                                continue;
                            }
                        };
                        if let Err(e) = websocket_tx.send(Message::Text(json.into())).await {
                            warn!("Failed to send frame, closing connection: {}", e);
                            break;
                        }
                    }
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        let _ = websocket_tx.send(Message::Close(None)).await;
                        break;
                    }
                    None => {
                        debug!("Internal channel closed");
                        break;
                    }
                }
            }

            _ = keepalive.tick() => {
                if let Err(e) = websocket_tx.send(Message::Ping(Default::default())).await {
                    warn!("Failed to send keep-alive ping: {}", e);
                    break;
                }
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    debug!("Write task terminated");
}

#[instrument(skip_all)]
async fn listen_ws(
    mut websocket_rx: SplitStream<WsStream>,
    events: UnboundedSender<SocketEvent>,
    internal_tx: UnboundedSender<InternalSignal>,
    connected: Arc<AtomicBool>,
) {
    debug!("Listen task started");

    'listen: while let Some(msg_result) = websocket_rx.next().await {
        let msg = match msg_result {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket error: {}", e);
                let _ = events.send(SocketEvent::error(format!("Connection lost: {e}")));
                break;
            }
        };

        match msg {
            Message::Text(text) => match decode_frame(text.as_str()) {
                Ok(decoded) => {
                    for event in decoded {
                        if events.send(event).is_err() {
                            debug!("Event receiver dropped");
                            break 'listen;
                        }
                    }
                }
                Err(e) => warn!("Failed to deserialize frame: {}", e),
            },
            Message::Close(_) => {
                info!("Close message received");
                break;
            }
            _ => {}
        }
    }

    connected.store(false, Ordering::SeqCst);
    let _ = internal_tx.send(InternalSignal::Shutdown);
    info!("Listen task terminated");
}
