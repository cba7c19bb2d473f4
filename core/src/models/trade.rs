use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::market::MarketKey;
use crate::scaling::raw_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        })
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("invalid trade side: {other}")),
        }
    }
}

/// A settled trade as stored in the trade log. Quantities are raw integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub pool_id: String,
    pub base: String,
    pub quote: String,
    pub base_qty: i64,
    pub quote_qty: i64,
    pub side: Side,
    pub ts_ms: i64,

    /// Settlement reference; unique together with `sub_index`.
    pub trade_ref: String,
    pub sub_index: u32,
}

impl TradeRow {
    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.pool_id.clone(), self.base.clone(), self.quote.clone())
    }

    pub fn raw_price(&self) -> Option<f64> {
        raw_price(self.base_qty, self.quote_qty)
    }

    pub fn trade_id(&self) -> String {
        format!("{}_{}", self.trade_ref, self.sub_index)
    }
}

/// A trade as served from the cache, in display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub market_name: String,
    pub price: f64,
    pub base_volume: f64,
    pub quote_volume: f64,
    pub timestamp: i64,
    pub time: String,
    pub trade_id: String,
    pub side: Side,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer: Option<String>,
}
