use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Leveraged position bucket, keyed in `PoolState::leverage_balances` by
/// token and leverage (e.g. `"x5"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeveragedPosition {
    pub supply: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccruedProfits {
    pub x: f64,
    pub y: f64,
}

/// Virtual reserve shifts of a concentrated-liquidity pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftParams {
    pub x0: f64,
    pub y0: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeParams {
    pub swap_fee: f64,
    pub arb_profit_tax: f64,
    pub leverage_profit_tax: f64,
    pub interest_rate: f64,
}

/// Point-in-time snapshot of an AMM pool.
///
/// Owned and mutated by the pricing function only. Every simulated swap in
/// the order-book walk runs on its own clone of this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    pub pool_id: String,
    pub x_asset: String,
    pub y_asset: String,
    pub x_balance: f64,
    pub y_balance: f64,
    pub leverage_balances: BTreeMap<String, LeveragedPosition>,
    pub accrued_profits: AccruedProfits,
    pub shift: ShiftParams,
    pub fees: FeeParams,
    pub last_interest_ts_ms: i64,
}

/// One depth level: price and the size available between this level and the
/// previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Synthetic order book derived from the pool's pricing curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub pool_id: String,
    /// Asset the sizes are denominated in.
    pub x_asset: String,
    /// Asset the prices are quoted in.
    pub y_asset: String,
    pub mid_price: f64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub as_of_ms: i64,
}
