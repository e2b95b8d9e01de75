// realtime/cache.rs
// Latest pushed value per topic, shared between the event path and readers.

use copytrade_common::{MarketDatum, TraderPerformance};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Default)]
struct CacheInner {
    prices: RwLock<Arc<HashMap<String, MarketDatum>>>,
    traders: DashMap<String, TraderPerformance>,
    portfolio: RwLock<Option<Value>>,
    last_trade: RwLock<Option<Value>>,
}

/// Cheap to clone; all clones see the same values.
#[derive(Clone, Default)]
pub struct LatestValueCache {
    inner: Arc<CacheInner>,
}

impl LatestValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ====================================================================
    // MARKET DATA
    // ====================================================================

    /// Swaps in a new price map. Symbols missing from `snapshot` are gone
    /// afterwards; readers see either the old map or the new one.
    pub fn replace_prices(&self, snapshot: HashMap<String, MarketDatum>) {
        let mut prices = self
            .inner
            .prices
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *prices = Arc::new(snapshot);
    }

    pub fn markets(&self) -> Arc<HashMap<String, MarketDatum>> {
        self.inner
            .prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.markets().get(symbol).map(|d| d.price)
    }

    // ====================================================================
    // TRADERS
    // ====================================================================

    pub fn set_trader_performance(&self, performance: TraderPerformance) {
        self.inner
            .traders
            .insert(performance.trader_wallet.clone(), performance);
    }

    pub fn trader_performance(&self, trader_wallet: &str) -> Option<TraderPerformance> {
        self.inner
            .traders
            .get(trader_wallet)
            .map(|entry| entry.value().clone())
    }

    pub fn tracked_traders(&self) -> Vec<String> {
        let mut traders: Vec<String> = self
            .inner
            .traders
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        traders.sort();
        traders
    }

    // ====================================================================
    // ACCOUNT
    // ====================================================================

    pub fn set_portfolio(&self, portfolio: Value) {
        *self
            .inner
            .portfolio
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(portfolio);
    }

    pub fn portfolio(&self) -> Option<Value> {
        self.inner
            .portfolio
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_last_trade(&self, trade: Value) {
        *self
            .inner
            .last_trade
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(trade);
    }

    pub fn last_trade(&self) -> Option<Value> {
        self.inner
            .last_trade
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn snapshot(entries: &[(&str, Decimal)]) -> HashMap<String, MarketDatum> {
        entries
            .iter()
            .map(|(symbol, price)| (symbol.to_string(), MarketDatum::new(*price)))
            .collect()
    }

    #[test]
    fn test_snapshot_replaces_instead_of_merging() {
        let cache = LatestValueCache::new();
        cache.replace_prices(snapshot(&[("BTC", dec!(100))]));
        cache.replace_prices(snapshot(&[("ETH", dec!(50))]));

        let markets = cache.markets();
        assert_eq!(markets.len(), 1);
        assert!(markets.contains_key("ETH"));
        assert_eq!(cache.price("BTC"), None);
        assert_eq!(cache.price("ETH"), Some(dec!(50)));
    }

    #[test]
    fn test_clones_share_state() {
        let cache = LatestValueCache::new();
        let reader = cache.clone();
        cache.replace_prices(snapshot(&[("SOL", dec!(142.5))]));
        assert_eq!(reader.price("SOL"), Some(dec!(142.5)));
    }

    #[test]
    fn test_old_snapshot_handle_is_unaffected() {
        let cache = LatestValueCache::new();
        cache.replace_prices(snapshot(&[("BTC", dec!(100))]));
        let held = cache.markets();
        cache.replace_prices(snapshot(&[("ETH", dec!(50))]));
        assert!(held.contains_key("BTC"));
    }

    #[test]
    fn test_trader_and_account_values() {
        let cache = LatestValueCache::new();
        assert!(cache.portfolio().is_none());

        let perf: TraderPerformance =
            serde_json::from_value(json!({ "traderWallet": "0xb", "pnl": 1 })).unwrap();
        cache.set_trader_performance(perf);
        let perf: TraderPerformance =
            serde_json::from_value(json!({ "traderWallet": "0xa", "pnl": 2 })).unwrap();
        cache.set_trader_performance(perf);
        let perf: TraderPerformance =
            serde_json::from_value(json!({ "traderWallet": "0xa", "pnl": 3 })).unwrap();
        cache.set_trader_performance(perf);

        assert_eq!(cache.tracked_traders(), vec!["0xa", "0xb"]);
        assert_eq!(cache.trader_performance("0xa").unwrap().metric("pnl"), Some(3.0));

        cache.set_portfolio(json!({ "totalValue": 10 }));
        cache.set_last_trade(json!({ "symbol": "BTC" }));
        assert_eq!(cache.portfolio(), Some(json!({ "totalValue": 10 })));
        assert_eq!(cache.last_trade(), Some(json!({ "symbol": "BTC" })));
    }
}
