#![allow(dead_code)]

use std::sync::Arc;

use corelib::{Asset, MarketKey, Side, TradeRow};
use market::{CancelSignal, EngineConfig, ManualClock, MarketManager};
use tradelog::{InMemoryAssets, InMemoryTradeLog};

pub const HOUR: i64 = 3_600_000;
pub const DAY0: i64 = 1_709_251_200_000;

pub struct Fixture {
    pub log: Arc<InMemoryTradeLog>,
    pub clock: Arc<ManualClock>,
    pub cancel: CancelSignal,
    pub manager: Arc<MarketManager>,
}

pub fn fixture(now_ms: i64) -> Fixture {
    let log = Arc::new(InMemoryTradeLog::new());
    let assets = Arc::new(InMemoryAssets::new());
    assets.insert(Asset::new("x", "XX", 0));
    assets.insert(Asset::new("y", "YY", 0));

    let clock = Arc::new(ManualClock::new(now_ms));
    let cancel = CancelSignal::new();
    let manager = MarketManager::new(log.clone(), assets, clock.clone(), EngineConfig::default(), cancel.clone());

    Fixture {
        log,
        clock,
        cancel,
        manager,
    }
}

pub fn push_trade(log: &InMemoryTradeLog, key: &MarketKey, trade_ref: &str, ts_ms: i64) {
    log.push_trade(TradeRow {
        pool_id: key.pool_id.clone(),
        base: key.base.clone(),
        quote: key.quote.clone(),
        base_qty: 1,
        quote_qty: 2,
        side: Side::Sell,
        ts_ms,
        trade_ref: trade_ref.into(),
        sub_index: 0,
    });
}
