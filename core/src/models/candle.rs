use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::market::MarketKey;
use crate::scaling::scale_amount;
use crate::time::{DAY_MS, HOUR_MS};

/// Candle granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Hourly,
    Daily,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::Hourly, Period::Daily];

    pub fn duration_ms(&self) -> i64 {
        match self {
            Period::Hourly => HOUR_MS,
            Period::Daily => DAY_MS,
        }
    }

    /// Floors a timestamp to this period's boundary (UTC).
    pub fn floor(&self, ts_ms: i64) -> i64 {
        ts_ms.div_euclid(self.duration_ms()) * self.duration_ms()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hourly => "hourly",
            Period::Daily => "daily",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Period::Hourly),
            "daily" => Ok(Period::Daily),
            other => Err(format!("period must be \"daily\" or \"hourly\", got {other:?}")),
        }
    }
}

/// Fee, interest and tax accumulators of one settlement window.
///
/// `base_*` fields are denominated in the base asset and `quote_*` fields in
/// the quote asset. The trade log returns raw sums; `scaled` converts them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base_interest: f64,
    pub quote_interest: f64,
    pub base_swap_fee: f64,
    pub quote_swap_fee: f64,
    pub base_arb_profit_tax: f64,
    pub quote_arb_profit_tax: f64,
    pub base_l_tax: f64,
    pub quote_l_tax: f64,
    pub base_exit_fee: f64,
    pub quote_exit_fee: f64,
    pub base_total_fee: f64,
    pub quote_total_fee: f64,
}

impl FeeBreakdown {
    pub fn scaled(&self, base_decimals: u32, quote_decimals: u32) -> Self {
        let b = |v: f64| scale_amount(v, base_decimals);
        let q = |v: f64| scale_amount(v, quote_decimals);

        Self {
            base_interest: b(self.base_interest),
            quote_interest: q(self.quote_interest),
            base_swap_fee: b(self.base_swap_fee),
            quote_swap_fee: q(self.quote_swap_fee),
            base_arb_profit_tax: b(self.base_arb_profit_tax),
            quote_arb_profit_tax: q(self.quote_arb_profit_tax),
            base_l_tax: b(self.base_l_tax),
            quote_l_tax: q(self.quote_l_tax),
            base_exit_fee: b(self.base_exit_fee),
            quote_exit_fee: q(self.quote_exit_fee),
            base_total_fee: b(self.base_total_fee),
            quote_total_fee: q(self.quote_total_fee),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// One OHLCV row. Unique per `(key, period, start_ms)`; recomputing replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub key: MarketKey,
    pub period: Period,
    pub start_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub base_volume: f64,
    pub quote_volume: f64,
    pub fees: FeeBreakdown,
}

impl Candle {
    /// A window without trades: every price equals the previous close.
    pub fn carried_forward(key: MarketKey, period: Period, start_ms: i64, prev_close: f64) -> Self {
        Self {
            key,
            period,
            start_ms,
            open: prev_close,
            high: prev_close,
            low: prev_close,
            close: prev_close,
            base_volume: 0.0,
            quote_volume: 0.0,
            fees: FeeBreakdown::default(),
        }
    }

    pub fn end_ms(&self) -> i64 {
        self.start_ms + self.period.duration_ms()
    }

    /// `low <= {open, close} <= high` and non-negative volumes.
    pub fn is_valid(&self) -> bool {
        self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
            && self.base_volume >= 0.0
            && self.quote_volume >= 0.0
    }
}
