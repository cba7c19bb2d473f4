#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use corelib::{Asset, Candle, FeeBreakdown, MarketKey, Period, PoolState, Side, TimeRange, TradeRow};
use market::orderbook::{BookSide, PoolPricing, PricingError};
use market::{CancelSignal, EngineConfig, ManualClock, MarketManager};
use tradelog::{InMemoryAssets, InMemoryTradeLog, TradeLog};

/// 2024-03-01T00:00:00Z
pub const DAY0: i64 = 1_709_251_200_000;
pub const MINUTE: i64 = 60_000;
pub const HOUR: i64 = 60 * MINUTE;

pub fn at(hour: i64, minute: i64) -> i64 {
    DAY0 + hour * HOUR + minute * MINUTE
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

pub fn key() -> MarketKey {
    MarketKey::new("POOL", "x", "y")
}

pub fn trade(key: &MarketKey, trade_ref: &str, ts_ms: i64, base_qty: i64, quote_qty: i64) -> TradeRow {
    TradeRow {
        pool_id: key.pool_id.clone(),
        base: key.base.clone(),
        quote: key.quote.clone(),
        base_qty,
        quote_qty,
        side: Side::Buy,
        ts_ms,
        trade_ref: trade_ref.into(),
        sub_index: 0,
    }
}

/// Assets `x` (0 decimals) and `y` (1 decimal): raw price 22 reads as 2.2.
pub fn assets() -> Arc<InMemoryAssets> {
    let assets = Arc::new(InMemoryAssets::new());
    assets.insert(Asset::new("x", "XX", 0));
    assets.insert(Asset::new("y", "YY", 1));
    assets
}

pub struct Harness<L> {
    pub log: Arc<L>,
    pub assets: Arc<InMemoryAssets>,
    pub clock: Arc<ManualClock>,
    pub cancel: CancelSignal,
    pub manager: Arc<MarketManager>,
}

pub fn harness_with<L: TradeLog + 'static>(log: L, now_ms: i64, config: EngineConfig) -> Harness<L> {
    let log = Arc::new(log);
    let assets = assets();
    let clock = Arc::new(ManualClock::new(now_ms));
    let cancel = CancelSignal::new();
    let manager = MarketManager::new(log.clone(), assets.clone(), clock.clone(), config, cancel.clone());

    Harness {
        log,
        assets,
        clock,
        cancel,
        manager,
    }
}

pub fn harness(now_ms: i64) -> Harness<InMemoryTradeLog> {
    harness_with(InMemoryTradeLog::new(), now_ms, EngineConfig::default())
}

/// Trade log whose trade queries for one pool block until the gate opens.
pub struct GatedLog {
    pub inner: InMemoryTradeLog,
    pub gate: Semaphore,
    pub gated_pool: String,
}

impl GatedLog {
    pub fn new(gated_pool: &str) -> Self {
        Self {
            inner: InMemoryTradeLog::new(),
            gate: Semaphore::new(0),
            gated_pool: gated_pool.to_string(),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1_000);
    }
}

#[async_trait]
impl TradeLog for GatedLog {
    async fn query_trades(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<TradeRow>> {
        if key.pool_id == self.gated_pool {
            let _permit = self.gate.acquire().await?;
        }
        self.inner.query_trades(key, range).await
    }

    async fn first_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>> {
        self.inner.first_trade(key).await
    }

    async fn last_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>> {
        self.inner.last_trade(key).await
    }

    async fn query_aggregate_fees(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<FeeBreakdown> {
        self.inner.query_aggregate_fees(key, range).await
    }

    async fn upsert_candle(&self, candle: &Candle) -> anyhow::Result<()> {
        self.inner.upsert_candle(candle).await
    }

    async fn last_candle(&self, period: Period, key: &MarketKey) -> anyhow::Result<Option<Candle>> {
        self.inner.last_candle(period, key).await
    }

    async fn query_candles(&self, period: Period, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<Candle>> {
        self.inner.query_candles(period, key, range).await
    }

    async fn known_markets(&self) -> anyhow::Result<Vec<MarketKey>> {
        self.inner.known_markets().await
    }
}

/// x * y = k pool with a cap on how far the price may be pushed.
pub struct ConstantProduct {
    pub pools: HashMap<String, PoolState>,
    pub max_move: f64,
}

pub fn pool_state(pool_id: &str, x_balance: f64, y_balance: f64) -> PoolState {
    PoolState {
        pool_id: pool_id.into(),
        x_asset: "x".into(),
        y_asset: "y".into(),
        x_balance,
        y_balance,
        leverage_balances: BTreeMap::new(),
        accrued_profits: Default::default(),
        shift: Default::default(),
        fees: Default::default(),
        last_interest_ts_ms: 0,
    }
}

impl ConstantProduct {
    pub fn single(state: PoolState, max_move: f64) -> Self {
        let mut pools = HashMap::new();
        pools.insert(state.pool_id.clone(), state);
        Self { pools, max_move }
    }
}

impl PoolPricing for ConstantProduct {
    fn pool_state(&self, pool_id: &str) -> Result<PoolState, PricingError> {
        self.pools
            .get(pool_id)
            .cloned()
            .ok_or_else(|| PricingError::PoolNotFound(pool_id.to_string()))
    }

    fn apply_accrued_interest(&self, state: &mut PoolState, now_ms: i64) -> Result<(), PricingError> {
        state.last_interest_ts_ms = now_ms;
        Ok(())
    }

    fn mid_price(&self, state: &PoolState) -> Result<f64, PricingError> {
        Ok(state.y_balance / state.x_balance)
    }

    fn simulate_swap(&self, mut state: PoolState, side: BookSide, target_price: f64) -> Result<f64, PricingError> {
        let mid = state.y_balance / state.x_balance;
        if target_price / mid > self.max_move || mid / target_price > self.max_move {
            return Err(PricingError::LeverageLimit);
        }

        let k = state.x_balance * state.y_balance;
        let x0 = state.x_balance;
        let x1 = (k / target_price).sqrt();

        // the snapshot is ours to mutate
        state.x_balance = x1;
        state.y_balance = k / x1;

        Ok(match side {
            BookSide::Ask => x0 - x1,
            BookSide::Bid => x1 - x0,
        })
    }
}
