use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// =================================================================
// Error Types
// =================================================================

/// Errors raised while reading or validating platform data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// =================================================================
// Real-time State
// =================================================================

/// Transport status as seen by the real-time client.
///
/// Only transport lifecycle events touch this. `authenticated` is not cleared
/// on disconnect, so `authenticated && !connected` is a reachable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub authenticated: bool,
    #[serde(rename = "lastPing")]
    pub last_ping: Option<DateTime<Utc>>,
    #[serde(rename = "reconnectAttempts")]
    pub reconnect_attempts: u32,
}

impl ConnectionStatus {
    /// Connected and authenticated at the same time
    pub fn is_live(&self) -> bool {
        self.connected && self.authenticated
    }
}

/// Latest market values for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDatum {
    pub price: Decimal,
    #[serde(rename = "change24h", default)]
    pub change_24h: Decimal,
    #[serde(rename = "volume24h", default)]
    pub volume_24h: Decimal,
    #[serde(
        rename = "lastUpdated",
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "lenient_timestamp",
        default = "Utc::now"
    )]
    pub last_updated: DateTime<Utc>,
}

/// Epoch milliseconds (number or numeric string) or RFC 3339. Anything else
/// reads as now so one odd timestamp cannot sink a whole snapshot.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|ms| ms as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(Utc::now))
}

impl MarketDatum {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            change_24h: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            last_updated: Utc::now(),
        }
    }
}

/// Performance figures pushed for a followed trader.
///
/// Everything except the trader wallet is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraderPerformance {
    #[serde(rename = "traderWallet")]
    pub trader_wallet: String,
    #[serde(flatten)]
    pub metrics: Map<String, Value>,
}

impl TraderPerformance {
    /// Numeric metric lookup; accepts JSON numbers and numeric strings
    pub fn metric(&self, key: &str) -> Option<f64> {
        match self.metrics.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

// =================================================================
// Wallet
// =================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    #[serde(rename = "isConnected")]
    pub is_connected: bool,
    pub address: Option<String>,
    pub balance: Option<Decimal>,
}

// =================================================================
// Chain
// =================================================================

/// Per-user vault record held by the copy-trading contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub owner: String,
    pub balance: Decimal,
    pub total_deposited: Decimal,
    pub total_withdrawn: Decimal,
    pub created_at: DateTime<Utc>,
}

// =================================================================
// Hosted Database Rows
// =================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub wallet_address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopySubscription {
    pub id: i64,
    pub follower_wallet: String,
    pub trader_wallet: String,
    #[serde(default)]
    pub allocation: Option<Decimal>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSide {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: i64,
    pub trader_wallet: String,
    pub symbol: String,
    pub side: SignalSide,
    pub entry_price: Decimal,
    #[serde(default)]
    pub size: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: i64,
    pub author_wallet: String,
    pub content: String,
    #[serde(default)]
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_market_datum_from_wire() {
        let datum: MarketDatum = serde_json::from_value(json!({
            "price": 64250.5,
            "change24h": -1.25,
            "volume24h": 1200000,
            "lastUpdated": 1_700_000_000_000i64
        }))
        .unwrap();

        assert_eq!(datum.price, dec!(64250.5));
        assert_eq!(datum.change_24h, dec!(-1.25));
        assert_eq!(datum.volume_24h, dec!(1200000));
        assert_eq!(datum.last_updated.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_market_datum_optional_fields() {
        let datum: MarketDatum = serde_json::from_value(json!({ "price": 2 })).unwrap();
        assert_eq!(datum.price, dec!(2));
        assert_eq!(datum.change_24h, Decimal::ZERO);
        assert_eq!(datum.volume_24h, Decimal::ZERO);
    }

    #[test]
    fn test_market_datum_timestamp_forms() {
        let iso: MarketDatum = serde_json::from_value(json!({
            "price": 1,
            "lastUpdated": "2023-11-14T22:13:20Z"
        }))
        .unwrap();
        assert_eq!(iso.last_updated.timestamp_millis(), 1_700_000_000_000);

        let text: MarketDatum = serde_json::from_value(json!({
            "price": 1,
            "lastUpdated": "1700000000000"
        }))
        .unwrap();
        assert_eq!(text.last_updated.timestamp_millis(), 1_700_000_000_000);

        let before = Utc::now();
        let junk: MarketDatum = serde_json::from_value(json!({
            "price": 1,
            "lastUpdated": "yesterday-ish"
        }))
        .unwrap();
        assert!(junk.last_updated >= before);
        assert_eq!(junk.price, dec!(1));
    }

    #[test]
    fn test_market_datum_serializes_millis() {
        let mut datum = MarketDatum::new(dec!(2));
        datum.last_updated = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let value = serde_json::to_value(&datum).unwrap();
        assert_eq!(value["lastUpdated"], json!(1_700_000_000_000i64));
    }

    #[test]
    fn test_trader_performance_metrics() {
        let perf: TraderPerformance = serde_json::from_value(json!({
            "traderWallet": "0xabc",
            "pnlPercent": 12.5,
            "winRate": "0.61",
            "label": "whale"
        }))
        .unwrap();

        assert_eq!(perf.trader_wallet, "0xabc");
        assert_eq!(perf.metric("pnlPercent"), Some(12.5));
        assert_eq!(perf.metric("winRate"), Some(0.61));
        assert_eq!(perf.metric("label"), None);
        assert_eq!(perf.metric("missing"), None);
    }

    #[test]
    fn test_status_live_requires_both_flags() {
        let mut status = ConnectionStatus::default();
        assert!(!status.is_live());

        status.connected = true;
        status.authenticated = true;
        assert!(status.is_live());

        status.connected = false;
        assert!(!status.is_live());
        assert!(status.authenticated);
    }
}
