//! Read surface handed to consumers (HTTP layer, CLI, tests).
//!
//! Cached views are served only after in-flight refreshes drain, bounded by
//! `EngineConfig::refresh_wait_timeout`. The order book does not read the
//! caches and never waits.

use std::collections::BTreeMap;
use std::sync::Arc;

use corelib::scaling::{price_coefficient, scale_amount};
use corelib::{Asset, BookLevel, Candle, Market, MarketKey, OrderBook, Period, Ticker, TimeRange, Trade};
use tracing::instrument;

use crate::error::MarketError;
use crate::manager::MarketManager;
use crate::orderbook::{OrderBookEmulator, OrderBookError};

#[derive(Clone)]
pub struct MarketQueries {
    manager: Arc<MarketManager>,
    order_book: Option<Arc<OrderBookEmulator>>,
}

impl MarketQueries {
    pub fn new(manager: Arc<MarketManager>) -> Self {
        Self {
            manager,
            order_book: None,
        }
    }

    pub fn with_order_book(mut self, emulator: OrderBookEmulator) -> Self {
        self.order_book = Some(Arc::new(emulator));
        self
    }

    fn live_market(&self, key: &MarketKey) -> Result<Market, MarketError> {
        self.manager
            .registry()
            .get(key)
            .ok_or_else(|| MarketError::unknown(key))
    }

    #[instrument(skip(self), fields(market = %key))]
    pub async fn get_ticker(&self, key: &MarketKey) -> Result<Ticker, MarketError> {
        self.manager.wait_idle().await?;
        let market = self.live_market(key)?;

        Ok(self
            .manager
            .cache()
            .ticker(key)
            .unwrap_or_else(|| Ticker::empty(&market)))
    }

    /// Trades of the trailing window, newest first.
    #[instrument(skip(self), fields(market = %key))]
    pub async fn get_recent_trades(&self, key: &MarketKey) -> Result<Vec<Trade>, MarketError> {
        self.manager.wait_idle().await?;
        self.live_market(key)?;

        Ok(self.manager.cache().trades(key).unwrap_or_default())
    }

    /// Candles starting in `[start_ms, end_ms)`, oldest first.
    #[instrument(skip(self), fields(market = %key))]
    pub async fn get_candles(
        &self,
        key: &MarketKey,
        period: Period,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, MarketError> {
        let range = TimeRange::new(start_ms, end_ms)?;
        self.manager.wait_idle().await?;
        self.live_market(key)?;

        Ok(self.manager.log().query_candles(period, key, range).await?)
    }

    /// Synthetic depth in display units.
    #[instrument(skip(self))]
    pub async fn get_order_book(&self, pool_id: &str) -> Result<OrderBook, MarketError> {
        let emulator = self.order_book.as_ref().ok_or(OrderBookError::NotConfigured)?;
        let mut book = emulator.emulate(pool_id)?;

        let x = self.asset(&book.x_asset).await?;
        let y = self.asset(&book.y_asset).await?;

        let coefficient = price_coefficient(x.decimals, y.decimals);
        let scale = |levels: &mut Vec<BookLevel>| {
            for level in levels.iter_mut() {
                level.price *= coefficient;
                level.size = scale_amount(level.size, x.decimals);
            }
        };
        scale(&mut book.bids);
        scale(&mut book.asks);
        book.mid_price *= coefficient;

        Ok(book)
    }

    async fn asset(&self, asset_id: &str) -> Result<Asset, MarketError> {
        self.manager
            .registry()
            .asset(asset_id)
            .await?
            .ok_or_else(|| MarketError::AssetUnresolved(asset_id.to_string()))
    }

    /// Ticker of every live market, ordered by key.
    pub async fn list_tickers(&self) -> Result<Vec<Ticker>, MarketError> {
        self.manager.wait_idle().await?;
        let cache = self.manager.cache();

        Ok(self
            .manager
            .registry()
            .all()
            .iter()
            .map(|m| cache.ticker(&m.key).unwrap_or_else(|| Ticker::empty(m)))
            .collect())
    }

    /// Every resolvable asset keyed by symbol, supply in display units.
    pub async fn list_assets(&self) -> Result<BTreeMap<String, Asset>, MarketError> {
        let assets = self.manager.registry().directory().list_assets().await?;
        Ok(assets
            .into_iter()
            .map(|mut a| {
                a.supply = a.scaled_supply();
                (a.symbol.clone(), a)
            })
            .collect())
    }

    pub async fn resolve_market(&self, pool_id: &str, market_name: &str) -> Result<Market, MarketError> {
        self.manager.wait_idle().await?;
        self.manager
            .registry()
            .resolve(pool_id, market_name)
            .ok_or_else(|| MarketError::UnknownMarket(format!("{pool_id}:{market_name}")))
    }

    pub fn markets_named(&self, market_name: &str) -> Vec<Market> {
        self.manager.registry().markets_named(market_name)
    }

    /// Coalesced fire-and-forget refresh; see `MarketManager::trigger_refresh`.
    pub fn trigger_refresh(&self, key: MarketKey) -> bool {
        self.manager.trigger_refresh(key)
    }
}
