//! In-memory stores for tests of the engine and the scheduler.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use corelib::{Asset, Candle, FeeBreakdown, MarketKey, NATIVE_ASSET_ID, Period, TimeRange, TradeRow};
use parking_lot::RwLock;

use crate::assets::AssetDirectory;
use crate::log::{SettlementRecord, TradeLog};

type CandleSeries = BTreeMap<i64, Candle>;

#[derive(Default)]
pub struct InMemoryTradeLog {
    trades: RwLock<Vec<TradeRow>>,
    settlements: RwLock<Vec<SettlementRecord>>,
    candles: RwLock<HashMap<(Period, MarketKey), CandleSeries>>,
    failing: AtomicBool,
    queries: AtomicUsize,
}

impl InMemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_trade(&self, trade: TradeRow) {
        let mut trades = self.trades.write();
        if trades
            .iter()
            .any(|t| t.trade_ref == trade.trade_ref && t.sub_index == trade.sub_index)
        {
            return;
        }
        trades.push(trade);
    }

    pub fn push_settlement(&self, record: SettlementRecord) {
        self.settlements.write().push(record);
    }

    /// Every stored candle of a series, oldest first.
    pub fn candles(&self, period: Period, key: &MarketKey) -> Vec<Candle> {
        self.candles
            .read()
            .get(&(period, key.clone()))
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Makes every following call fail until switched off again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of trait calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn enter(&self) -> anyhow::Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("trade log unavailable");
        }
        Ok(())
    }

    fn sorted_trades(&self, key: &MarketKey) -> Vec<TradeRow> {
        let mut rows: Vec<TradeRow> = self
            .trades
            .read()
            .iter()
            .filter(|t| t.pool_id == key.pool_id && t.base == key.base && t.quote == key.quote)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.ts_ms, &a.trade_ref, a.sub_index).cmp(&(b.ts_ms, &b.trade_ref, b.sub_index))
        });
        rows
    }
}

fn add_fees(acc: &mut FeeBreakdown, f: &FeeBreakdown) {
    acc.base_interest += f.base_interest;
    acc.quote_interest += f.quote_interest;
    acc.base_swap_fee += f.base_swap_fee;
    acc.quote_swap_fee += f.quote_swap_fee;
    acc.base_arb_profit_tax += f.base_arb_profit_tax;
    acc.quote_arb_profit_tax += f.quote_arb_profit_tax;
    acc.base_l_tax += f.base_l_tax;
    acc.quote_l_tax += f.quote_l_tax;
    acc.base_exit_fee += f.base_exit_fee;
    acc.quote_exit_fee += f.quote_exit_fee;
    acc.base_total_fee += f.base_total_fee;
    acc.quote_total_fee += f.quote_total_fee;
}

#[async_trait]
impl TradeLog for InMemoryTradeLog {
    async fn query_trades(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<TradeRow>> {
        self.enter()?;
        Ok(self
            .sorted_trades(key)
            .into_iter()
            .filter(|t| range.contains(t.ts_ms))
            .collect())
    }

    async fn first_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>> {
        self.enter()?;
        Ok(self.sorted_trades(key).into_iter().next())
    }

    async fn last_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>> {
        self.enter()?;
        Ok(self.sorted_trades(key).pop())
    }

    async fn query_aggregate_fees(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<FeeBreakdown> {
        self.enter()?;
        let mut acc = FeeBreakdown::default();
        for r in self.settlements.read().iter() {
            if &r.key() == key && range.contains(r.ts_ms) {
                add_fees(&mut acc, &r.fees);
            }
        }
        Ok(acc)
    }

    async fn upsert_candle(&self, candle: &Candle) -> anyhow::Result<()> {
        self.enter()?;
        self.candles
            .write()
            .entry((candle.period, candle.key.clone()))
            .or_default()
            .insert(candle.start_ms, candle.clone());
        Ok(())
    }

    async fn last_candle(&self, period: Period, key: &MarketKey) -> anyhow::Result<Option<Candle>> {
        self.enter()?;
        Ok(self
            .candles
            .read()
            .get(&(period, key.clone()))
            .and_then(|s| s.values().next_back().cloned()))
    }

    async fn query_candles(&self, period: Period, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<Candle>> {
        self.enter()?;
        Ok(self
            .candles
            .read()
            .get(&(period, key.clone()))
            .map(|s| s.range(range.start_ms..range.end_ms).map(|(_, c)| c.clone()).collect())
            .unwrap_or_default())
    }

    async fn known_markets(&self) -> anyhow::Result<Vec<MarketKey>> {
        self.enter()?;
        let mut keys: Vec<MarketKey> = self.trades.read().iter().map(TradeRow::key).collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[derive(Default)]
pub struct InMemoryAssets {
    assets: RwLock<HashMap<String, Asset>>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, asset: Asset) {
        self.assets.write().insert(asset.id.clone(), asset);
    }

    pub fn remove(&self, asset_id: &str) {
        self.assets.write().remove(asset_id);
    }
}

#[async_trait]
impl AssetDirectory for InMemoryAssets {
    async fn resolve_asset(&self, asset_id: &str) -> anyhow::Result<Option<Asset>> {
        let found = self.assets.read().get(asset_id).cloned();
        Ok(found.or_else(|| (asset_id == NATIVE_ASSET_ID).then(Asset::native)))
    }

    async fn list_assets(&self) -> anyhow::Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.assets.read().values().cloned().collect();
        if !assets.iter().any(Asset::is_native) {
            assets.push(Asset::native());
        }
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(assets)
    }
}
