// realtime/client.rs
// Push-event client: one connection, status tracking, latest-value cache.

use chrono::Utc;
use copytrade_common::ConnectionStatus;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::cache::LatestValueCache;
use super::errors::RealtimeError;
use super::protocol::{ClientMessage, Handshake, ServerEvent, TransportEvent};
use super::traits::{Connection, EventSender, TaggedEvent, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    /// Lost; the transport retries on its own
    Disconnected,
    /// Torn down by the owner
    Closed,
}

pub struct RealtimeClient {
    transport: Arc<dyn Transport>,
    handshake: Handshake,
    connection: Option<Box<dyn Connection>>,
    state: ConnectionState,
    status: ConnectionStatus,
    status_tx: watch::Sender<ConnectionStatus>,
    cache: LatestValueCache,
    subscriptions: BTreeSet<String>,
    /// Id of the current connection; events tagged with any other are stale
    connection_id: u64,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,
    events_rx: mpsc::UnboundedReceiver<TaggedEvent>,
}

impl RealtimeClient {
    pub fn new(transport: Arc<dyn Transport>, handshake: Handshake) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        Self {
            transport,
            handshake,
            connection: None,
            state: ConnectionState::Idle,
            status: ConnectionStatus::default(),
            status_tx,
            cache: LatestValueCache::new(),
            subscriptions: BTreeSet::new(),
            connection_id: 0,
            events_tx,
            events_rx,
        }
    }

    /// Opens the connection unless the current one is already open.
    ///
    /// A previous connection that is no longer open is closed before the new
    /// one is created, and anything it still reports is ignored.
    pub fn initialize(&mut self) -> Result<(), RealtimeError> {
        if let Some(connection) = &self.connection {
            if connection.is_open() {
                debug!("realtime connection already open");
                return Ok(());
            }
        }
        if let Some(stale) = self.connection.take() {
            stale.close();
        }

        self.connection_id += 1;
        let events = EventSender::new(self.connection_id, self.events_tx.clone());
        let connection = self.transport.open(&self.handshake, events)?;
        self.connection = Some(connection);
        self.state = ConnectionState::Connecting;
        info!(
            wallet = %self.handshake.wallet_address,
            connection = self.connection_id,
            "realtime connection opening"
        );
        Ok(())
    }

    /// Applies one transport event. This is the only place status and cache
    /// change.
    pub fn apply(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.status.connected = true;
                self.status.authenticated = true;
                self.status.reconnect_attempts = 0;
                self.status.last_ping = Some(Utc::now());
                self.state = ConnectionState::Connected;
                info!("realtime connected");
            }
            TransportEvent::Disconnected(reason) => {
                // authenticated and cached values are kept
                self.status.connected = false;
                if self.state != ConnectionState::Closed {
                    self.state = ConnectionState::Disconnected;
                }
                warn!(%reason, "realtime disconnected");
            }
            TransportEvent::Error(message) => {
                warn!(%message, "realtime connection error");
            }
            TransportEvent::ReconnectAttempt(attempt) => {
                self.status.reconnect_attempts = attempt;
                debug!(attempt, "realtime reconnect attempt");
            }
            TransportEvent::Message(event) => {
                self.apply_server_event(event);
                return;
            }
        }
        self.status_tx.send_replace(self.status.clone());
    }

    fn apply_server_event(&mut self, event: ServerEvent) {
        debug!(topic = event.topic(), "realtime push");
        match event {
            ServerEvent::MarketDataUpdate(snapshot) => self.cache.replace_prices(snapshot),
            ServerEvent::PortfolioUpdate(portfolio) => self.cache.set_portfolio(portfolio),
            ServerEvent::TraderPerformance(performance)
            | ServerEvent::TraderPerformanceUpdate(performance) => {
                self.cache.set_trader_performance(performance)
            }
            ServerEvent::TradeUpdate(trade) => self.cache.set_last_trade(trade),
        }
    }

    /// Waits for the next event from the current connection, applies it and
    /// hands it back. Events from replaced connections are skipped.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            let (connection_id, event) = self.events_rx.recv().await?;
            if connection_id != self.connection_id {
                debug!(connection_id, ?event, "dropping event from replaced connection");
                continue;
            }
            self.apply(event.clone());
            return Some(event);
        }
    }

    /// Asks the server for trader pushes. Does nothing while disconnected.
    pub fn subscribe_to_trader(&mut self, trader_wallet: &str) -> Result<(), RealtimeError> {
        let Some(connection) = self.open_connection() else {
            debug!(trader = trader_wallet, "not connected, trader subscription skipped");
            return Ok(());
        };
        connection.emit(&ClientMessage::SubscribeTrader {
            trader_wallet: trader_wallet.to_string(),
        })?;
        self.subscriptions.insert(trader_wallet.to_string());
        info!(trader = trader_wallet, "subscribed to trader");
        Ok(())
    }

    /// Logs the request only; nothing is sent to the server.
    pub fn subscribe_to_market_data(&self, symbols: &[String]) {
        info!(?symbols, "market data subscription requested");
    }

    /// Asks for a fresh portfolio push for the handshake wallet. Does nothing
    /// while disconnected.
    pub fn request_portfolio(&self) -> Result<(), RealtimeError> {
        let Some(connection) = self.open_connection() else {
            debug!("not connected, portfolio request skipped");
            return Ok(());
        };
        connection.emit(&ClientMessage::GetPortfolio {
            wallet_address: self.handshake.wallet_address.clone(),
        })
    }

    pub fn get_latest_price(&self, symbol: &str) -> Option<Decimal> {
        self.cache.price(symbol)
    }

    /// Closes the current connection, if any
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            info!("realtime connection closed");
        }
        self.state = ConnectionState::Closed;
    }

    fn open_connection(&self) -> Option<&dyn Connection> {
        self.connection
            .as_deref()
            .filter(|connection| connection.is_open())
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Status feed for tasks that do not own the client
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    pub fn cache(&self) -> &LatestValueCache {
        &self.cache
    }

    pub fn is_subscribed(&self, trader_wallet: &str) -> bool {
        self.subscriptions.contains(trader_wallet)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(String::as_str)
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}
