//! WebSocket stream transport.
//!
//! [`EmSocket`] owns one tokio-tungstenite connection. A background task
//! drives both directions: inbound text frames go to the listener
//! registry, outbound frames arrive through an unbounded channel. Lifecycle
//! changes are broadcast as [`SocketEvent`]s.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::registry::{Listener, ListenerId, ListenerRegistry};
use super::transport::StreamTransport;
use crate::rpc::TransportError;

const EVENT_CAPACITY: usize = 16;

/// Connection lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open,
    Error(String),
    Close,
}

type Outgoing = Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>;

/// A WebSocket client for the Edge Matrix event stream.
///
/// Create it with [`EmSocket::new`], subscribe to [`EmSocket::events`] if
/// lifecycle notifications matter, then [`connect`](EmSocket::connect).
pub struct EmSocket {
    url: String,
    listeners: Arc<ListenerRegistry>,
    events: broadcast::Sender<SocketEvent>,
    outgoing: Outgoing,
}

impl EmSocket {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            url: url.into(),
            listeners: Arc::new(ListenerRegistry::new()),
            events,
            outgoing: Arc::new(Mutex::new(None)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Receiver for lifecycle events emitted after this call.
    pub fn events(&self) -> broadcast::Receiver<SocketEvent> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.outgoing.lock().is_some()
    }

    /// Opens the connection. Connecting an already open socket is a no-op.
    pub async fn connect(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            warn!(url = %self.url, "websocket already connected");
            return Ok(());
        }
        if self.url.is_empty() {
            return Err(TransportError::WebSocket("websocket url is empty".to_string()));
        }

        let (ws, _) = match tokio_tungstenite::connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                let _ = self.events.send(SocketEvent::Error(e.to_string()));
                return Err(TransportError::WebSocket(e.to_string()));
            }
        };

        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        *self.outgoing.lock() = Some(tx);
        info!(url = %self.url, "websocket opened");
        let _ = self.events.send(SocketEvent::Open);

        let listeners = Arc::clone(&self.listeners);
        let events = self.events.clone();
        let outgoing = Arc::clone(&self.outgoing);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    inbound = stream.next() => match inbound {
                        Some(Ok(Message::Text(text))) => {
                            let delivered = listeners.dispatch(&text);
                            debug!(delivered, "websocket frame dispatched");
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "websocket read failed");
                            let _ = events.send(SocketEvent::Error(e.to_string()));
                            break;
                        }
                    },
                    outbound = rx.recv() => match outbound {
                        Some(message) => {
                            let closing = matches!(message, Message::Close(_));
                            if let Err(e) = sink.send(message).await {
                                warn!(error = %e, "websocket write failed");
                                let _ = events.send(SocketEvent::Error(e.to_string()));
                                break;
                            }
                            if closing {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            *outgoing.lock() = None;
            debug!("websocket closed");
            let _ = events.send(SocketEvent::Close);
        });

        Ok(())
    }

    /// Sends a close frame. Closing a disconnected socket is an error.
    pub fn close(&self) -> Result<(), TransportError> {
        self.enqueue(Message::Close(None))
    }

    fn enqueue(&self, message: Message) -> Result<(), TransportError> {
        let guard = self.outgoing.lock();
        let sender = guard.as_ref().ok_or(TransportError::Disconnected)?;
        sender
            .send(message)
            .map_err(|_| TransportError::Disconnected)
    }
}

impl std::fmt::Debug for EmSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmSocket")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[async_trait]
impl StreamTransport for EmSocket {
    async fn send(&self, text: String) -> Result<(), TransportError> {
        self.enqueue(Message::Text(text))
    }

    fn add_listener(&self, listener: Listener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
