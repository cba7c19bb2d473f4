use corelib::{MarketKey, RangeParseError};
use thiserror::Error;

use crate::orderbook::OrderBookError;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("unknown market: {0}")]
    UnknownMarket(String),

    #[error("asset {0} cannot be resolved")]
    AssetUnresolved(String),

    /// In-flight refreshes outlasted the wait budget. Safe to retry.
    #[error("timed out waiting for in-flight refreshes")]
    RefreshTimeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid range: {0}")]
    InvalidRange(#[from] RangeParseError),

    #[error("order book unavailable: {0}")]
    OrderBookUnavailable(#[from] OrderBookError),

    #[error("trade log error: {0}")]
    Store(#[from] anyhow::Error),
}

impl MarketError {
    pub fn unknown(key: &MarketKey) -> Self {
        Self::UnknownMarket(key.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RefreshTimeout | Self::Store(_))
    }
}
