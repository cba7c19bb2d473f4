//! Incremental OHLCV candle builder.
//!
//! Each series is advanced from its last stored candle (replaced in place)
//! through every later window up to and including the one containing "now".
//! Windows without trades carry the previous close forward, so a series has
//! exactly one candle per period boundary from the first trade onward.

use std::sync::Arc;

use common::logger::warn_if_slow;
use corelib::{Candle, FeeBreakdown, Market, Period, TimeRange, TradeRow};
use tracing::{debug, instrument};
use tradelog::TradeLog;

use crate::cancel::CancelSignal;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::MarketError;

pub struct CandleBuilder {
    log: Arc<dyn TradeLog>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl CandleBuilder {
    pub fn new(log: Arc<dyn TradeLog>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self { log, clock, config }
    }

    /// Advances the hourly then the daily series. Returns the number of
    /// candles written.
    pub async fn advance(&self, market: &Market, cancel: &CancelSignal) -> Result<usize, MarketError> {
        let mut written = 0;
        for period in Period::ALL {
            written += self.advance_period(market, period, cancel).await?;
        }
        Ok(written)
    }

    #[instrument(skip_all, fields(market = %market.key, period = %period))]
    pub async fn advance_period(
        &self,
        market: &Market,
        period: Period,
        cancel: &CancelSignal,
    ) -> Result<usize, MarketError> {
        let key = &market.key;
        let now = self.clock.now_ms();

        cancel.check()?;
        let last = self.log.last_candle(period, key).await?;

        // `existing` is the candle of the first window, kept when that window has no trades.
        let (mut start, mut existing) = match last {
            Some(c) => (c.start_ms, Some(c)),
            None => {
                cancel.check()?;
                match self.log.first_trade(key).await? {
                    Some(first) => (period.floor(first.ts_ms), None),
                    None => {
                        debug!("no trades yet, nothing to seed from");
                        return Ok(0);
                    }
                }
            }
        };

        let mut prev_close: Option<f64> = None;
        let mut written = 0;

        loop {
            let window = TimeRange {
                start_ms: start,
                end_ms: start + period.duration_ms(),
            };

            cancel.check()?;
            let trades = warn_if_slow(
                "query_trades",
                self.config.slow_query_threshold,
                self.log.query_trades(key, window),
            )
            .await?;

            let candle = match aggregate(market, period, window.start_ms, &trades) {
                Some(mut c) => {
                    cancel.check()?;
                    let fees = self.log.query_aggregate_fees(key, window).await?;
                    c.fees = fees.scaled(market.base_decimals, market.quote_decimals);
                    Some(c)
                }
                None => match (existing.take(), prev_close) {
                    (Some(kept), _) => {
                        prev_close = Some(kept.close);
                        None
                    }
                    (None, Some(close)) => Some(Candle::carried_forward(key.clone(), period, start, close)),
                    (None, None) => None,
                },
            };
            existing = None;

            if let Some(c) = candle {
                self.log.upsert_candle(&c).await?;
                prev_close = Some(c.close);
                written += 1;
            }

            if window.end_ms > now {
                break;
            }
            start = window.end_ms;
        }

        debug!(written, "candle series advanced");
        Ok(written)
    }
}

/// OHLCV of the trades inside one window; `None` when no trade carries a price.
fn aggregate(market: &Market, period: Period, start_ms: i64, trades: &[TradeRow]) -> Option<Candle> {
    let mut priced = trades
        .iter()
        .filter_map(|t| t.raw_price().map(|p| (market.scale_price(p), t)));

    let (first_price, first) = priced.next()?;
    let mut candle = Candle {
        key: market.key.clone(),
        period,
        start_ms,
        open: first_price,
        high: first_price,
        low: first_price,
        close: first_price,
        base_volume: market.scale_base(first.base_qty as f64),
        quote_volume: market.scale_quote(first.quote_qty as f64),
        fees: FeeBreakdown::default(),
    };

    for (price, t) in priced {
        candle.high = candle.high.max(price);
        candle.low = candle.low.min(price);
        candle.close = price;
        candle.base_volume += market.scale_base(t.base_qty as f64);
        candle.quote_volume += market.scale_quote(t.quote_qty as f64);
    }

    Some(candle)
}
