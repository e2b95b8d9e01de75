// realtime/ws.rs
// ====
// Push-event transport: WebSocket first, HTTP polling as fallback.
// The transport task owns reconnection; the client only sees events.
// ====

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{self, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::errors::RealtimeError;
use super::polling::PollingSession;
use super::protocol::{ClientMessage, Frame, Handshake, ServerEvent, TransportEvent};
use super::traits::{Connection, EventSender, Transport};
use crate::config::RealtimeSettings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Websocket,
    Polling,
}

/// Reconnect schedule: `delay` doubling per attempt up to `delay_max`.
/// `max_attempts = None` retries forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub delay_max: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            delay_max: Duration::from_millis(5000),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.delay.saturating_mul(factor).min(self.delay_max)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

#[derive(Debug, Clone)]
pub struct WsTransport {
    ws_url: Url,
    poll_url: Option<Url>,
    poll_interval: Duration,
    transports: Vec<TransportKind>,
    reconnect: ReconnectPolicy,
    http: reqwest::Client,
}

impl WsTransport {
    pub fn new(ws_url: &str) -> Result<Self, RealtimeError> {
        Ok(Self {
            ws_url: Url::parse(ws_url)?,
            poll_url: None,
            poll_interval: Duration::from_millis(1000),
            transports: vec![TransportKind::Websocket, TransportKind::Polling],
            reconnect: ReconnectPolicy::default(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
        })
    }

    pub fn from_settings(settings: &RealtimeSettings) -> Result<Self, RealtimeError> {
        let mut transport = Self::new(&settings.ws_url)?
            .with_transports(settings.transports.clone())
            .with_reconnect(ReconnectPolicy {
                delay: Duration::from_millis(settings.reconnect_delay_ms),
                delay_max: Duration::from_millis(settings.reconnect_delay_max_ms),
                max_attempts: settings.reconnect_attempts,
            });
        if let Some(poll_url) = &settings.poll_url {
            transport =
                transport.with_polling(poll_url, Duration::from_millis(settings.poll_interval_ms))?;
        }
        Ok(transport)
    }

    pub fn with_polling(mut self, poll_url: &str, interval: Duration) -> Result<Self, RealtimeError> {
        self.poll_url = Some(Url::parse(poll_url)?);
        self.poll_interval = interval;
        Ok(self)
    }

    pub fn with_transports(mut self, transports: Vec<TransportKind>) -> Self {
        self.transports = transports;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

impl Transport for WsTransport {
    fn open(
        &self,
        handshake: &Handshake,
        events: EventSender,
    ) -> Result<Box<dyn Connection>, RealtimeError> {
        let runtime = Handle::try_current().map_err(|e| RealtimeError::Runtime(e.to_string()))?;
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        let driver = Driver {
            config: self.clone(),
            handshake: handshake.clone(),
            events,
            outgoing: outgoing_rx,
            open: open.clone(),
        };
        runtime.spawn(driver.run());

        Ok(Box::new(WsConnection {
            outgoing: outgoing_tx,
            open,
        }))
    }
}

enum Outgoing {
    Frame(Frame),
    Close,
}

pub struct WsConnection {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    open: Arc<AtomicBool>,
}

impl Connection for WsConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn emit(&self, message: &ClientMessage) -> Result<(), RealtimeError> {
        if !self.is_open() {
            return Err(RealtimeError::NotConnected);
        }
        self.outgoing
            .send(Outgoing::Frame(message.to_frame()))
            .map_err(|_| RealtimeError::NotConnected)
    }

    fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

// ====================================================================
// TRANSPORT TASK
// ====================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Session {
    WebSocket(WsStream),
    Polling(PollingSession, Vec<Frame>),
}

enum SessionEnd {
    Closed,
    Lost(String),
}

struct Driver {
    config: WsTransport,
    handshake: Handshake,
    events: EventSender,
    outgoing: mpsc::UnboundedReceiver<Outgoing>,
    open: Arc<AtomicBool>,
}

impl Driver {
    async fn run(mut self) {
        let mut attempt = 0u32;
        loop {
            match self.establish().await {
                Ok(session) => {
                    attempt = 0;
                    self.open.store(true, Ordering::Release);
                    self.send(TransportEvent::Connected);

                    let end = match session {
                        Session::WebSocket(stream) => self.run_websocket(stream).await,
                        Session::Polling(session, pending) => {
                            self.run_polling(session, pending).await
                        }
                    };
                    self.open.store(false, Ordering::Release);

                    match end {
                        SessionEnd::Closed => {
                            self.send(TransportEvent::Disconnected("client close".to_string()));
                            break;
                        }
                        SessionEnd::Lost(reason) => {
                            self.send(TransportEvent::Disconnected(reason));
                        }
                    }
                }
                Err(e) => {
                    warn!("realtime connect failed: {}", e);
                    self.send(TransportEvent::Error(e.to_string()));
                }
            }

            attempt += 1;
            if !self.config.reconnect.allows(attempt) {
                warn!(attempt, "realtime reconnect attempts exhausted");
                self.send(TransportEvent::Disconnected(
                    "reconnect attempts exhausted".to_string(),
                ));
                break;
            }
            self.send(TransportEvent::ReconnectAttempt(attempt));
            if !self.wait(self.config.reconnect.delay_for(attempt)).await {
                break;
            }
        }
        self.open.store(false, Ordering::Release);
        debug!("realtime transport task finished");
    }

    /// Tries each configured transport in order
    async fn establish(&self) -> Result<Session, RealtimeError> {
        let mut last_error = RealtimeError::InvalidEndpoint("no transport configured".to_string());

        for kind in &self.config.transports {
            match kind {
                TransportKind::Websocket => {
                    let mut url = self.config.ws_url.clone();
                    self.handshake.apply_to(&mut url);
                    match timeout(CONNECT_TIMEOUT, connect_async(url.as_str())).await {
                        Ok(Ok((stream, _))) => {
                            info!("realtime websocket connected");
                            return Ok(Session::WebSocket(stream));
                        }
                        Ok(Err(e)) => last_error = e.into(),
                        Err(_) => {
                            last_error = RealtimeError::NetworkError("websocket connect timed out".to_string())
                        }
                    }
                    debug!("websocket unavailable: {}", last_error);
                }
                TransportKind::Polling => {
                    let Some(poll_url) = &self.config.poll_url else {
                        continue;
                    };
                    let session = PollingSession::new(
                        self.config.http.clone(),
                        poll_url,
                        &self.handshake,
                        self.config.poll_interval,
                    );
                    match session.poll().await {
                        Ok(pending) => {
                            info!("realtime polling session established");
                            return Ok(Session::Polling(session, pending));
                        }
                        Err(e) => last_error = e,
                    }
                    debug!("polling unavailable: {}", last_error);
                }
            }
        }
        Err(last_error)
    }

    async fn run_websocket(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();
        loop {
            tokio::select! {
                cmd = self.outgoing.recv() => match cmd {
                    Some(Outgoing::Frame(frame)) => {
                        match serde_json::to_string(&frame) {
                            Ok(text) => {
                                if let Err(e) = write.send(Message::Text(text)).await {
                                    return SessionEnd::Lost(e.to_string());
                                }
                            }
                            Err(e) => warn!("dropping unencodable frame: {}", e),
                        }
                    }
                    Some(Outgoing::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        return SessionEnd::Closed;
                    }
                },

                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.forward_text(&text),
                    Some(Ok(Message::Binary(bin))) => match String::from_utf8(bin) {
                        Ok(text) => self.forward_text(&text),
                        Err(_) => debug!("ignoring non-utf8 binary frame"),
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return SessionEnd::Lost(format!("server close: {:?}", frame));
                    }
                    Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                    None => return SessionEnd::Lost("stream ended".to_string()),
                    _ => {}
                },
            }
        }
    }

    async fn run_polling(&mut self, session: PollingSession, pending: Vec<Frame>) -> SessionEnd {
        for frame in pending {
            self.forward_frame(frame);
        }

        let mut ticker = time::interval(session.interval());
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                cmd = self.outgoing.recv() => match cmd {
                    Some(Outgoing::Frame(frame)) => {
                        if let Err(e) = session.send(&frame).await {
                            return SessionEnd::Lost(e.to_string());
                        }
                    }
                    Some(Outgoing::Close) | None => return SessionEnd::Closed,
                },

                _ = ticker.tick() => match session.poll().await {
                    Ok(frames) => {
                        for frame in frames {
                            self.forward_frame(frame);
                        }
                    }
                    Err(e) => return SessionEnd::Lost(e.to_string()),
                },
            }
        }
    }

    /// Sleeps out a reconnect delay. Returns false if the owner closed the
    /// connection meanwhile.
    async fn wait(&mut self, delay: Duration) -> bool {
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                cmd = self.outgoing.recv() => match cmd {
                    Some(Outgoing::Frame(frame)) => {
                        debug!(event = %frame.event, "dropping frame while reconnecting");
                    }
                    Some(Outgoing::Close) | None => return false,
                },
            }
        }
    }

    fn forward_text(&self, text: &str) {
        match ServerEvent::decode(text) {
            Ok(Some(event)) => self.send(TransportEvent::Message(event)),
            Ok(None) => {}
            Err(e) => {
                warn!("undecodable push frame: {}", e);
                self.send(TransportEvent::Error(e.to_string()));
            }
        }
    }

    fn forward_frame(&self, frame: Frame) {
        match ServerEvent::from_frame(frame) {
            Ok(Some(event)) => self.send(TransportEvent::Message(event)),
            Ok(None) => {}
            Err(e) => {
                warn!("undecodable push frame: {}", e);
                self.send(TransportEvent::Error(e.to_string()));
            }
        }
    }

    fn send(&self, event: TransportEvent) {
        // Receiver gone means the client was dropped; the close command follows.
        let _ = self.events.send(event);
    }
}
