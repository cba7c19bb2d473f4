use async_trait::async_trait;
use corelib::{Candle, FeeBreakdown, MarketKey, Period, TimeRange, TradeRow};

/// One row of the settlement log. Fee fields are raw and recorded under the
/// pool's canonical `(base, quote)` orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRecord {
    pub pool_id: String,
    pub settlement_ref: String,
    pub base: String,
    pub quote: String,
    pub kind: String,
    pub ts_ms: i64,
    pub fees: FeeBreakdown,
}

impl SettlementRecord {
    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.pool_id.clone(), self.base.clone(), self.quote.clone())
    }
}

#[async_trait]
pub trait TradeLog: Send + Sync {
    /// Trades of exactly this orientation inside `range`, oldest first.
    async fn query_trades(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<TradeRow>>;

    async fn first_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>>;

    async fn last_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>>;

    /// Raw fee sums of the settlement rows recorded under `key`'s orientation.
    /// An inverse orientation matches no rows and yields zeroes.
    async fn query_aggregate_fees(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<FeeBreakdown>;

    /// Insert, or replace the row at `(key, period, start_ms)`.
    async fn upsert_candle(&self, candle: &Candle) -> anyhow::Result<()>;

    async fn last_candle(&self, period: Period, key: &MarketKey) -> anyhow::Result<Option<Candle>>;

    /// Candles starting inside `range`, oldest first.
    async fn query_candles(&self, period: Period, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<Candle>>;

    /// Every `(pool_id, base, quote)` with at least one recorded trade.
    async fn known_markets(&self) -> anyhow::Result<Vec<MarketKey>>;
}
