// realtime/protocol.rs
// Push-event wire format: JSON text frames `{"event": <name>, "payload": <json>}`

use copytrade_common::{MarketDatum, TraderPerformance};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use super::errors::RealtimeError;
use crate::wallet::{WalletError, WalletHolder};

/// Message the server signs over during the handshake
pub const AUTH_MESSAGE_PREFIX: &str = "copytrade-auth:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// Client -> server requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    SubscribeTrader { trader_wallet: String },
    GetPortfolio { wallet_address: String },
}

impl ClientMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::SubscribeTrader { .. } => "subscribe_trader",
            ClientMessage::GetPortfolio { .. } => "get_portfolio",
        }
    }

    pub fn to_frame(&self) -> Frame {
        let payload = match self {
            ClientMessage::SubscribeTrader { trader_wallet } => {
                json!({ "traderWallet": trader_wallet })
            }
            ClientMessage::GetPortfolio { wallet_address } => {
                json!({ "walletAddress": wallet_address })
            }
        };
        Frame {
            event: self.event_name().to_string(),
            payload,
        }
    }

    pub fn encode(&self) -> Result<String, RealtimeError> {
        Ok(serde_json::to_string(&self.to_frame())?)
    }
}

/// Server -> client pushes
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    PortfolioUpdate(Value),
    /// Full snapshot keyed by symbol
    MarketDataUpdate(HashMap<String, MarketDatum>),
    TraderPerformance(TraderPerformance),
    TraderPerformanceUpdate(TraderPerformance),
    TradeUpdate(Value),
}

#[derive(Debug, Deserialize)]
struct MarketDataPayload {
    data: HashMap<String, MarketDatum>,
}

impl ServerEvent {
    /// Decodes a text frame. Unknown event names yield `Ok(None)`.
    pub fn decode(text: &str) -> Result<Option<Self>, RealtimeError> {
        let frame: Frame = serde_json::from_str(text)?;
        Self::from_frame(frame)
    }

    pub fn from_frame(frame: Frame) -> Result<Option<Self>, RealtimeError> {
        let event = match frame.event.as_str() {
            "portfolio_update" => ServerEvent::PortfolioUpdate(frame.payload),
            "market_data_update" => {
                let payload: MarketDataPayload = serde_json::from_value(frame.payload)?;
                ServerEvent::MarketDataUpdate(payload.data)
            }
            "trader_performance" => {
                ServerEvent::TraderPerformance(serde_json::from_value(frame.payload)?)
            }
            "trader_performance_update" => {
                ServerEvent::TraderPerformanceUpdate(serde_json::from_value(frame.payload)?)
            }
            "trade_update" => ServerEvent::TradeUpdate(frame.payload),
            other => {
                debug!(event = other, "ignoring unknown server event");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    pub fn topic(&self) -> &'static str {
        match self {
            ServerEvent::PortfolioUpdate(_) => "portfolio_update",
            ServerEvent::MarketDataUpdate(_) => "market_data_update",
            ServerEvent::TraderPerformance(_) => "trader_performance",
            ServerEvent::TraderPerformanceUpdate(_) => "trader_performance_update",
            ServerEvent::TradeUpdate(_) => "trade_update",
        }
    }
}

/// Everything a transport reports back to the client
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected(String),
    Error(String),
    ReconnectAttempt(u32),
    Message(ServerEvent),
}

/// Identity credential sent when a connection is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub wallet_address: String,
    pub signature: Option<String>,
}

impl Handshake {
    pub fn new(wallet_address: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            signature: None,
        }
    }

    /// Builds the handshake from a connected wallet. When the wallet holds a
    /// real key, the address is signed as proof of ownership.
    pub fn for_wallet(wallet: &WalletHolder) -> Result<Self, WalletError> {
        let address = wallet.state().address.ok_or(WalletError::NotConnected)?;
        let signature = match wallet.signer() {
            Some(signer) => Some(
                signer
                    .sign_message(&auth_message(&address))
                    .map_err(|e| WalletError::Signing(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            wallet_address: address,
            signature,
        })
    }

    /// Appends the credential as query parameters
    pub fn apply_to(&self, url: &mut Url) {
        let mut query = url.query_pairs_mut();
        query.append_pair("walletAddress", &self.wallet_address);
        if let Some(signature) = &self.signature {
            query.append_pair("signature", signature);
        }
    }
}

pub fn auth_message(address: &str) -> String {
    format!("{}{}", AUTH_MESSAGE_PREFIX, address.to_lowercase())
}
