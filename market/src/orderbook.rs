//! Synthetic order book.
//!
//! Walks the pool's pricing curve outward from the mid price and records, at
//! each price step, how much base asset the pool absorbs or releases between
//! the previous step and this one. Every simulation runs on its own copy of
//! the pool snapshot.

use std::sync::Arc;

use corelib::{BookLevel, OrderBook, PoolState};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::config::EngineConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("pool {0} not found")]
    PoolNotFound(String),

    #[error("liquidity exhausted")]
    LiquidityExhausted,

    #[error("leverage limit reached")]
    LeverageLimit,

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderBookError {
    #[error("pricing failed: {0}")]
    Pricing(#[from] PricingError),

    /// Cumulative depth shrank between two steps.
    #[error("negative depth {size} at price {price}")]
    NegativeDepth { price: f64, size: f64 },

    /// The pricing function produced a NaN or infinite cumulative amount.
    #[error("non-finite depth {cumulative} at price {price}")]
    NonFiniteDepth { price: f64, cumulative: f64 },

    #[error("invalid mid price {0}")]
    InvalidMidPrice(f64),

    #[error("no pricing source configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    /// Prices above mid: base bought out of the pool.
    Ask,
    /// Prices below mid: base sold into the pool.
    Bid,
}

/// The AMM math, consumed as an opaque collaborator.
pub trait PoolPricing: Send + Sync {
    fn pool_state(&self, pool_id: &str) -> Result<PoolState, PricingError>;

    fn apply_accrued_interest(&self, state: &mut PoolState, now_ms: i64) -> Result<(), PricingError>;

    /// Price of x in y.
    fn mid_price(&self, state: &PoolState) -> Result<f64, PricingError>;

    /// Cumulative base amount swapped to move the pool price from mid to
    /// `target_price`. Consumes its snapshot so one step cannot leak into the next.
    fn simulate_swap(&self, state: PoolState, side: BookSide, target_price: f64) -> Result<f64, PricingError>;
}

pub struct OrderBookEmulator {
    pricing: Arc<dyn PoolPricing>,
    clock: Arc<dyn Clock>,
    first_offset: f64,
    step_ratio: f64,
    depth_range: f64,
}

impl OrderBookEmulator {
    pub fn new(pricing: Arc<dyn PoolPricing>, clock: Arc<dyn Clock>, config: &EngineConfig) -> Self {
        Self {
            pricing,
            clock,
            first_offset: config.book_first_offset,
            step_ratio: config.book_step_ratio,
            depth_range: config.book_depth_range,
        }
    }

    #[instrument(skip(self))]
    pub fn emulate(&self, pool_id: &str) -> Result<OrderBook, OrderBookError> {
        let now = self.clock.now_ms();
        let mut state = self.pricing.pool_state(pool_id)?;
        self.pricing.apply_accrued_interest(&mut state, now)?;

        let mid = self.pricing.mid_price(&state)?;
        if !mid.is_finite() || mid <= 0.0 {
            return Err(OrderBookError::InvalidMidPrice(mid));
        }

        let ask_limit = mid * self.depth_range;
        let asks = self.walk(&state, BookSide::Ask, mid * self.first_offset, |p| p <= ask_limit)?;

        let bid_limit = mid / self.depth_range;
        let bids = self.walk(&state, BookSide::Bid, mid / self.first_offset, |p| p >= bid_limit)?;

        debug!(mid, asks = asks.len(), bids = bids.len(), "order book emulated");

        Ok(OrderBook {
            pool_id: pool_id.to_string(),
            x_asset: state.x_asset,
            y_asset: state.y_asset,
            mid_price: mid,
            bids,
            asks,
            as_of_ms: now,
        })
    }

    fn walk(
        &self,
        state: &PoolState,
        side: BookSide,
        start: f64,
        within: impl Fn(f64) -> bool,
    ) -> Result<Vec<BookLevel>, OrderBookError> {
        let mut levels = Vec::new();
        let mut prev_cumulative = 0.0;
        let mut price = start;

        while within(price) {
            let cumulative = match self.pricing.simulate_swap(state.clone(), side, price) {
                Ok(c) => c,
                Err(e) => {
                    debug!(?side, price, reason = %e, "walk stopped early");
                    break;
                }
            };

            if !cumulative.is_finite() {
                return Err(OrderBookError::NonFiniteDepth { price, cumulative });
            }

            let size = cumulative - prev_cumulative;
            if size < 0.0 {
                return Err(OrderBookError::NegativeDepth { price, size });
            }
            levels.push(BookLevel { price, size });
            prev_cumulative = cumulative;

            price = match side {
                BookSide::Ask => price * self.step_ratio,
                BookSide::Bid => price / self.step_ratio,
            };
        }

        Ok(levels)
    }
}
