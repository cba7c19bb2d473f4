use serde::{Deserialize, Serialize};

use super::market::Market;

/// 24h statistics of one market.
///
/// `low_24h`/`high_24h` are absent when the trailing window is empty;
/// `last_price` looks back without bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub market_name: String,
    pub pool_id: String,
    pub base_id: String,
    pub quote_id: String,
    pub base_symbol: String,
    pub quote_symbol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<f64>,

    pub base_volume_24h: f64,
    pub quote_volume_24h: f64,
    pub updated_at_ms: i64,
}

impl Ticker {
    /// Identity fields only; statistics start empty.
    pub fn empty(market: &Market) -> Self {
        Self {
            market_name: market.market_name.clone(),
            pool_id: market.key.pool_id.clone(),
            base_id: market.key.base.clone(),
            quote_id: market.key.quote.clone(),
            base_symbol: market.base_symbol.clone(),
            quote_symbol: market.quote_symbol.clone(),
            last_price: None,
            low_24h: None,
            high_24h: None,
            base_volume_24h: 0.0,
            quote_volume_24h: 0.0,
            updated_at_ms: 0,
        }
    }
}
