// display.rs
// Read-only view models over the real-time cache and wallet state.

use copytrade_common::format::{format_percent, format_price, format_usd, shorten_address};
use copytrade_common::{ConnectionStatus, MarketDatum, WalletState};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::fmt;

use crate::realtime::{ConnectionState, LatestValueCache, RealtimeClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRow {
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub volume: String,
    pub is_up: bool,
}

impl MarketRow {
    pub fn new(symbol: &str, datum: &MarketDatum) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: format_price(datum.price),
            change: format_percent(datum.change_24h),
            volume: format_usd(datum.volume_24h),
            is_up: !datum.change_24h.is_sign_negative(),
        }
    }
}

impl fmt::Display for MarketRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:>16} {:>9} {:>18}",
            self.symbol, self.price, self.change, self.volume
        )
    }
}

/// Rows for every cached symbol, sorted by symbol
pub fn market_board(cache: &LatestValueCache) -> Vec<MarketRow> {
    let markets = cache.markets();
    let mut rows: Vec<MarketRow> = markets
        .iter()
        .map(|(symbol, datum)| MarketRow::new(symbol, datum))
        .collect();
    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraderCard {
    pub trader: String,
    pub subscribed: bool,
    pub pnl: Option<String>,
    pub win_rate: Option<String>,
    pub followers: Option<u64>,
}

impl TraderCard {
    pub fn new(client: &RealtimeClient, trader_wallet: &str) -> Self {
        let performance = client.cache().trader_performance(trader_wallet);
        let metric = |key: &str| performance.as_ref().and_then(|p| p.metric(key));

        Self {
            trader: shorten_address(trader_wallet),
            subscribed: client.is_subscribed(trader_wallet),
            pnl: metric("pnlPercent")
                .and_then(Decimal::from_f64)
                .map(format_percent),
            win_rate: metric("winRate")
                .and_then(|rate| Decimal::from_f64(rate * 100.0))
                .map(|pct| format!("{}%", pct.round_dp(1))),
            followers: metric("followers").map(|n| n.max(0.0) as u64),
        }
    }
}

impl fmt::Display for TraderCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] pnl {} win {}",
            self.trader,
            if self.subscribed { "following" } else { "not following" },
            self.pnl.as_deref().unwrap_or("-"),
            self.win_rate.as_deref().unwrap_or("-"),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Live,
    Connecting,
    /// Lost connection; the status may still claim authenticated
    Offline { stale_auth: bool },
    Closed,
}

impl StatusBadge {
    pub fn new(state: ConnectionState, status: &ConnectionStatus) -> Self {
        match state {
            ConnectionState::Closed => StatusBadge::Closed,
            ConnectionState::Idle | ConnectionState::Connecting => StatusBadge::Connecting,
            ConnectionState::Connected if status.is_live() => StatusBadge::Live,
            ConnectionState::Connected | ConnectionState::Disconnected => StatusBadge::Offline {
                stale_auth: status.authenticated && !status.connected,
            },
        }
    }
}

impl fmt::Display for StatusBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusBadge::Live => write!(f, "LIVE"),
            StatusBadge::Connecting => write!(f, "CONNECTING"),
            StatusBadge::Offline { stale_auth: true } => write!(f, "OFFLINE (authenticated)"),
            StatusBadge::Offline { stale_auth: false } => write!(f, "OFFLINE"),
            StatusBadge::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Header line for a wallet
pub fn wallet_line(wallet: &WalletState) -> String {
    match (&wallet.address, wallet.is_connected) {
        (Some(address), true) => format!(
            "{} | {}",
            shorten_address(address),
            wallet
                .balance
                .map(format_usd)
                .unwrap_or_else(|| "balance unknown".to_string())
        ),
        _ => "wallet not connected".to_string(),
    }
}
