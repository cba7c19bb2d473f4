use std::fmt;

use serde::{Deserialize, Serialize};

use super::asset::Asset;
use crate::scaling::{price_coefficient, scale_amount};

/// Canonical identity of a market: one pool, one (base, quote) orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketKey {
    pub pool_id: String,
    pub base: String,
    pub quote: String,
}

impl MarketKey {
    pub fn new(pool_id: impl Into<String>, base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Same pool, base and quote swapped.
    pub fn inverse(&self) -> Self {
        Self {
            pool_id: self.pool_id.clone(),
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.pool_id, self.base, self.quote)
    }
}

/// A live market. Exists only while both assets resolve.
///
/// `market_name` is human readable and may collide across pools; pair it with
/// `key.pool_id` to disambiguate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub key: MarketKey,
    pub base_symbol: String,
    pub quote_symbol: String,
    pub market_name: String,
    pub base_decimals: u32,
    pub quote_decimals: u32,
}

impl Market {
    pub fn new(key: MarketKey, base: &Asset, quote: &Asset, separator: &str) -> Self {
        Self {
            market_name: format!("{}{}{}", base.symbol, separator, quote.symbol),
            base_symbol: base.symbol.clone(),
            quote_symbol: quote.symbol.clone(),
            base_decimals: base.decimals,
            quote_decimals: quote.decimals,
            key,
        }
    }

    pub fn price_coefficient(&self) -> f64 {
        price_coefficient(self.base_decimals, self.quote_decimals)
    }

    /// Raw `quote_qty / base_qty` ratio to display price.
    pub fn scale_price(&self, raw: f64) -> f64 {
        raw * self.price_coefficient()
    }

    pub fn scale_base(&self, raw: f64) -> f64 {
        scale_amount(raw, self.base_decimals)
    }

    pub fn scale_quote(&self, raw: f64) -> f64 {
        scale_amount(raw, self.quote_decimals)
    }
}
