use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::common::events::{EVENT_CONNECT, EVENT_DISCONNECT};
use crate::error::ConnectionError;

use super::frame::Packet;

pub type EventHandler = Box<dyn Fn(Option<Value>) + Send + Sync>;

/// Kết nối full-duplex tới relay, nhìn từ phía Sync Engine.
pub trait Relay: Send + 'static {
    /// Non-blocking; failures end up in the log, never in the caller.
    fn connect(&mut self);
    /// Handler is invoked once per inbound occurrence of `event`.
    fn on_event(&mut self, event: &str, handler: EventHandler);
    /// Fire-and-forget.
    fn send(&self, event: &str, payload: Value);
    fn off_all(&mut self);
    /// Idempotent, safe before any successful connect.
    fn disconnect(&mut self);
}

/// Retry budget after the relay drops. Zero keeps a lost connection lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// 1s, 2s, 4s ... capped at 32s.
    pub fn delay_for(attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(5);
        Duration::from_millis(1000 << exponent)
    }
}

type SharedHandler = Arc<dyn Fn(Option<Value>) + Send + Sync>;
type HandlerMap = HashMap<String, Vec<SharedHandler>>;

#[derive(Clone, Default)]
struct Handlers(Arc<Mutex<HandlerMap>>);

impl Handlers {
    fn lock(&self) -> MutexGuard<'_, HandlerMap> {
        // a panicking handler must not take the whole relay down with it
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handlers run after the lock is released, so they may register or
    /// clear handlers themselves.
    fn dispatch(&self, event: &str, payload: Option<Value>) {
        let targets: Vec<SharedHandler> = match self.lock().get(event) {
            Some(list) => list.clone(),
            None => {
                log::trace!("No handler for relay event `{event}`");
                return;
            }
        };
        for handler in targets {
            handler(payload.clone());
        }
    }
}

enum Outbound {
    Frame(String),
    Close,
}

enum SessionEnd {
    ClosedLocally,
    Dropped { joined: bool },
}

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Quản lý vòng đời socket tới relay (Socket.IO v4 qua WebSocket).
pub struct ConnectionManager {
    endpoint: String,
    reconnect: ReconnectPolicy,
    handlers: Handlers,
    connected: Arc<AtomicBool>,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(endpoint: impl Into<String>, reconnect: ReconnectPolicy) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect,
            handlers: Handlers::default(),
            connected: Arc::new(AtomicBool::new(false)),
            outbound: None,
            task: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Relay for ConnectionManager {
    fn connect(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            log::debug!("Relay connection already running");
            return;
        }

        let url = match socket_url(&self.endpoint) {
            Ok(url) => url,
            Err(err) => {
                log::error!("Relay connect failed: {err}");
                return;
            }
        };
        log::info!("Connecting to relay at {url}");

        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound = Some(tx);
        self.task = Some(tokio::spawn(run_connection_loop(
            url,
            self.handlers.clone(),
            Arc::clone(&self.connected),
            rx,
            self.reconnect,
        )));
    }

    fn on_event(&mut self, event: &str, handler: EventHandler) {
        self.handlers
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(Arc::from(handler));
    }

    fn send(&self, event: &str, payload: Value) {
        let not_connected = || ConnectionError::NotConnected {
            event: event.to_string(),
        };

        let Some(outbound) = self.outbound.as_ref().filter(|_| self.is_connected()) else {
            log::warn!("{}", not_connected());
            return;
        };

        let frame = match Packet::event(event, payload).encode() {
            Ok(frame) => frame,
            Err(source) => {
                let err = ConnectionError::Encode {
                    event: event.to_string(),
                    source,
                };
                log::error!("{err}");
                return;
            }
        };

        log::debug!("-> {frame}");
        if outbound.send(Outbound::Frame(frame)).is_err() {
            log::warn!("{}", not_connected());
        }
    }

    fn off_all(&mut self) {
        self.handlers.lock().clear();
    }

    fn disconnect(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            log::info!("Disconnecting from relay");
            // the loop may already be gone
            let _ = outbound.send(Outbound::Close);
        }
        self.task = None;
        self.connected.store(false, Ordering::Release);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// `https://host/` -> `wss://host/socket.io/?EIO=4&transport=websocket`
pub fn socket_url(endpoint: &str) -> Result<Url, ConnectionError> {
    let invalid = |reason: String| ConnectionError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme `{other}`"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot switch to `{scheme}`")))?;

    if !url.path().ends_with("/socket.io/") {
        let path = format!("{}/socket.io/", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");

    Ok(url)
}

async fn run_connection_loop(
    url: Url,
    handlers: Handlers,
    connected: Arc<AtomicBool>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    reconnect: ReconnectPolicy,
) {
    let mut attempts: u32 = 0;

    loop {
        let result = tokio::select! {
            result = tokio_tungstenite::connect_async(url.as_str()) => result,
            () = wait_for_close(&mut outbound) => {
                log::info!("Relay connect abandoned");
                return;
            }
        };

        match result {
            Ok((socket, _response)) => {
                log::info!("WebSocket to relay open");
                match drive_session(socket, &handlers, &connected, &mut outbound).await {
                    SessionEnd::ClosedLocally => break,
                    SessionEnd::Dropped { joined } => {
                        if joined {
                            attempts = 0;
                        }
                    }
                }
            }
            Err(err) => {
                log::error!("Relay connection failed: {}", ConnectionError::from(err));
            }
        }

        attempts += 1;
        if attempts > reconnect.max_attempts {
            log::info!("Not reconnecting to relay (attempts used: {})", attempts - 1);
            break;
        }

        let delay = ReconnectPolicy::delay_for(attempts);
        log::info!(
            "Reconnecting to relay in {}ms (attempt {attempts})",
            delay.as_millis()
        );
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = wait_for_close(&mut outbound) => break,
        }
    }

    log::info!("Relay connection loop ended");
}

/// Drains emits issued while no session is joined; they are not queued.
async fn wait_for_close(outbound: &mut mpsc::UnboundedReceiver<Outbound>) {
    loop {
        match outbound.recv().await {
            Some(Outbound::Frame(frame)) => {
                log::warn!("Dropping frame while not connected: {frame}");
            }
            Some(Outbound::Close) | None => return,
        }
    }
}

async fn drive_session(
    socket: RelaySocket,
    handlers: &Handlers,
    connected: &AtomicBool,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();
    let mut joined = false;

    let end = loop {
        tokio::select! {
            incoming = read.next() => {
                let text = match incoming {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => {
                        log::info!("Relay closed the connection");
                        break SessionEnd::Dropped { joined };
                    }
                    Some(Err(err)) => {
                        log::error!("Relay connection error: {}", ConnectionError::from(err));
                        break SessionEnd::Dropped { joined };
                    }
                    Some(Ok(_)) => continue,
                };
                log::trace!("<- {}", text.as_str());

                let reply = match Packet::parse(text.as_str()) {
                    Ok(Packet::Open(handshake)) => {
                        log::debug!("Relay handshake: {handshake}");
                        Some(Packet::Connect)
                    }
                    Ok(Packet::Ping) => Some(Packet::Pong),
                    Ok(Packet::Connect) => {
                        joined = true;
                        connected.store(true, Ordering::Release);
                        log::info!("Connected to relay");
                        handlers.dispatch(EVENT_CONNECT, None);
                        None
                    }
                    Ok(Packet::Event { name, payload }) => {
                        handlers.dispatch(&name, payload);
                        None
                    }
                    Ok(Packet::ConnectError(reason)) => {
                        log::error!("{}", ConnectionError::Refused(reason.to_string()));
                        break SessionEnd::Dropped { joined };
                    }
                    Ok(Packet::Disconnect | Packet::Close) => {
                        log::info!("Relay ended the session");
                        break SessionEnd::Dropped { joined };
                    }
                    Ok(other) => {
                        log::trace!("Ignoring relay packet {other:?}");
                        None
                    }
                    Err(err) => {
                        log::warn!("Unreadable relay frame: {err}");
                        None
                    }
                };

                if let Some(reply) = reply {
                    if let Err(err) = send_packet(&mut write, &reply).await {
                        log::error!("Relay write failed: {err}");
                        break SessionEnd::Dropped { joined };
                    }
                }
            }
            command = outbound.recv() => {
                match command {
                    Some(Outbound::Frame(frame)) if !joined => {
                        log::warn!("Dropping frame before namespace connect: {frame}");
                    }
                    Some(Outbound::Frame(frame)) => {
                        if let Err(err) = write.send(WsMessage::Text(frame.into())).await {
                            log::error!("Relay write failed: {}", ConnectionError::from(err));
                            break SessionEnd::Dropped { joined };
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = send_packet(&mut write, &Packet::Disconnect).await;
                        let _ = write.close().await;
                        break SessionEnd::ClosedLocally;
                    }
                }
            }
        }
    };

    if joined {
        connected.store(false, Ordering::Release);
        log::info!("Disconnected from relay");
        handlers.dispatch(EVENT_DISCONNECT, None);
    }
    end
}

async fn send_packet<S>(write: &mut S, packet: &Packet) -> Result<(), ConnectionError>
where
    S: futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let frame = packet.encode().map_err(|source| ConnectionError::Encode {
        event: format!("{packet:?}"),
        source,
    })?;
    write.send(WsMessage::Text(frame.into())).await?;
    Ok(())
}
