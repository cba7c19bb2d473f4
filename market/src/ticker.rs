//! Ticker & trade cache.
//!
//! Both views are rebuilt wholesale from the trade log on every refresh of a
//! market; nothing is patched incrementally.

use std::collections::HashMap;

use common::logger::warn_if_slow;
use corelib::time::to_iso;
use corelib::{Market, MarketKey, Ticker, TimeRange, Trade, TradeRow};
use parking_lot::RwLock;
use tracing::{debug, instrument};
use tradelog::TradeLog;

use crate::cancel::CancelSignal;
use crate::config::EngineConfig;
use crate::error::MarketError;

#[derive(Default)]
pub struct TickerCache {
    tickers: RwLock<HashMap<MarketKey, Ticker>>,
    trades: RwLock<HashMap<MarketKey, Vec<Trade>>>,
}

/// Display price of a row, `None` when its base leg is empty.
fn scaled_price(market: &Market, row: &TradeRow) -> Option<f64> {
    row.raw_price().map(|p| market.scale_price(p))
}

impl TickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached trade list with the trailing window, newest first.
    #[instrument(skip_all, fields(market = %market.key))]
    pub async fn rebuild_trades(
        &self,
        market: &Market,
        log: &dyn TradeLog,
        config: &EngineConfig,
        now_ms: i64,
        cancel: &CancelSignal,
    ) -> Result<usize, MarketError> {
        cancel.check()?;
        let window = TimeRange::trailing(now_ms, config.trade_window_ms);
        let rows = warn_if_slow(
            "query_trades",
            config.slow_query_threshold,
            log.query_trades(&market.key, window),
        )
        .await?;

        let mut trades: Vec<Trade> = rows
            .iter()
            .filter_map(|row| {
                let Some(price) = scaled_price(market, row) else {
                    debug!(trade_id = %row.trade_id(), "skipping trade with empty base leg");
                    return None;
                };
                Some(Trade {
                    market_name: market.market_name.clone(),
                    price,
                    base_volume: market.scale_base(row.base_qty as f64),
                    quote_volume: market.scale_quote(row.quote_qty as f64),
                    timestamp: row.ts_ms,
                    time: to_iso(row.ts_ms),
                    trade_id: row.trade_id(),
                    side: row.side,
                    explorer: config.explorer_link(&row.trade_ref),
                })
            })
            .collect();
        trades.reverse();

        let count = trades.len();
        self.trades.write().insert(market.key.clone(), trades);
        Ok(count)
    }

    /// Recomputes the 24h statistics. An empty window clears low/high and
    /// zeroes the volumes; `last_price` looks back without bound.
    #[instrument(skip_all, fields(market = %market.key))]
    pub async fn rebuild_ticker(
        &self,
        market: &Market,
        log: &dyn TradeLog,
        config: &EngineConfig,
        now_ms: i64,
        cancel: &CancelSignal,
    ) -> Result<Ticker, MarketError> {
        cancel.check()?;
        let window = TimeRange::trailing(now_ms, config.trade_window_ms);
        let rows = warn_if_slow(
            "query_trades",
            config.slow_query_threshold,
            log.query_trades(&market.key, window),
        )
        .await?;

        cancel.check()?;
        let last = log.last_trade(&market.key).await?;

        let mut ticker = Ticker::empty(market);
        ticker.updated_at_ms = now_ms;
        ticker.last_price = last.as_ref().and_then(|row| scaled_price(market, row));

        for row in &rows {
            ticker.base_volume_24h += market.scale_base(row.base_qty as f64);
            ticker.quote_volume_24h += market.scale_quote(row.quote_qty as f64);

            if let Some(price) = scaled_price(market, row) {
                ticker.low_24h = Some(ticker.low_24h.map_or(price, |l| l.min(price)));
                ticker.high_24h = Some(ticker.high_24h.map_or(price, |h| h.max(price)));
            }
        }

        self.tickers.write().insert(market.key.clone(), ticker.clone());
        Ok(ticker)
    }

    pub fn ticker(&self, key: &MarketKey) -> Option<Ticker> {
        self.tickers.read().get(key).cloned()
    }

    pub fn trades(&self, key: &MarketKey) -> Option<Vec<Trade>> {
        self.trades.read().get(key).cloned()
    }

    /// Drops both views of a market that left the registry.
    pub fn remove(&self, key: &MarketKey) {
        self.tickers.write().remove(key);
        self.trades.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::time::HOUR_MS;
    use corelib::{Asset, Side};
    use tradelog::InMemoryTradeLog;

    const NOW: i64 = 100 * HOUR_MS;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn market() -> Market {
        Market::new(
            MarketKey::new("P", "x", "y"),
            &Asset::new("x", "X", 2),
            &Asset::new("y", "Y", 0),
            "-",
        )
    }

    fn row(trade_ref: &str, ts_ms: i64, base_qty: i64, quote_qty: i64) -> TradeRow {
        TradeRow {
            pool_id: "P".into(),
            base: "x".into(),
            quote: "y".into(),
            base_qty,
            quote_qty,
            side: Side::Buy,
            ts_ms,
            trade_ref: trade_ref.into(),
            sub_index: 0,
        }
    }

    #[tokio::test]
    async fn trades_are_scaled_and_newest_first() {
        let log = InMemoryTradeLog::new();
        log.push_trade(row("old", NOW - 2 * HOUR_MS, 100, 2));
        log.push_trade(row("new", NOW - HOUR_MS, 200, 5));
        log.push_trade(row("stale", NOW - 30 * HOUR_MS, 100, 9));

        let cache = TickerCache::new();
        let config = EngineConfig::default().with_explorer("https://explorer/#");
        let n = cache
            .rebuild_trades(&market(), &log, &config, NOW, &CancelSignal::new())
            .await
            .unwrap();
        assert_eq!(n, 2);

        let trades = cache.trades(&market().key).unwrap();
        assert_eq!(trades[0].trade_id, "new_0");
        assert!(approx(Some(trades[0].price), 2.5));
        assert_eq!(trades[0].base_volume, 2.0);
        assert_eq!(trades[0].quote_volume, 5.0);
        assert_eq!(trades[0].explorer.as_deref(), Some("https://explorer/#new"));
        assert_eq!(trades[1].trade_id, "old_0");
    }

    #[tokio::test]
    async fn ticker_aggregates_the_trailing_window() {
        let log = InMemoryTradeLog::new();
        log.push_trade(row("a", NOW - 3 * HOUR_MS, 100, 2));
        log.push_trade(row("b", NOW - 2 * HOUR_MS, 100, 3));
        log.push_trade(row("c", NOW - HOUR_MS, 100, 1));

        let cache = TickerCache::new();
        let t = cache
            .rebuild_ticker(&market(), &log, &EngineConfig::default(), NOW, &CancelSignal::new())
            .await
            .unwrap();

        assert!(approx(t.last_price, 1.0));
        assert!(approx(t.low_24h, 1.0));
        assert!(approx(t.high_24h, 3.0));
        assert_eq!(t.base_volume_24h, 3.0);
        assert_eq!(t.quote_volume_24h, 6.0);
    }

    #[tokio::test]
    async fn empty_window_clears_stale_statistics() {
        let log = InMemoryTradeLog::new();
        log.push_trade(row("a", NOW - HOUR_MS, 100, 2));

        let cache = TickerCache::new();
        let config = EngineConfig::default();
        let cancel = CancelSignal::new();
        cache.rebuild_ticker(&market(), &log, &config, NOW, &cancel).await.unwrap();

        let later = NOW + 48 * HOUR_MS;
        let t = cache.rebuild_ticker(&market(), &log, &config, later, &cancel).await.unwrap();
        assert_eq!(t.low_24h, None);
        assert_eq!(t.high_24h, None);
        assert_eq!(t.base_volume_24h, 0.0);
        assert_eq!(t.quote_volume_24h, 0.0);
        assert!(approx(t.last_price, 2.0));

        cache.rebuild_trades(&market(), &log, &config, later, &cancel).await.unwrap();
        assert!(cache.trades(&market().key).unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_rebuild_leaves_cache_alone() {
        let log = InMemoryTradeLog::new();
        let cache = TickerCache::new();
        let cancel = CancelSignal::new();
        cancel.cancel();

        let res = cache
            .rebuild_ticker(&market(), &log, &EngineConfig::default(), NOW, &cancel)
            .await;
        assert!(matches!(res, Err(MarketError::Cancelled)));
        assert!(cache.ticker(&market().key).is_none());
        assert_eq!(log.query_count(), 0);
    }
}
