//! MarketManager
//!
//! Refresh coordinator of the engine. For one `(pool, base, quote)` key at a
//! time it:
//!   • re-resolves both assets and (re)creates or removes the market
//!   • rebuilds the trade cache and the ticker
//!   • advances the hourly and daily candle series
//!
//! A trigger for a key that is already refreshing is dropped, not queued:
//! bursts of settlement events collapse into the in-flight refresh. The number
//! of refreshes in flight is published on a watch channel so that readers can
//! wait for the current epoch to drain before serving cached data.

use std::collections::HashSet;
use std::sync::Arc;

use common::logger::{TraceId, market_span, root_span};
use corelib::{Market, MarketKey};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, warn};
use tradelog::{AssetDirectory, TradeLog};

use crate::cancel::CancelSignal;
use crate::candles::CandleBuilder;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::MarketError;
use crate::registry::MarketRegistry;
use crate::ticker::TickerCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Pipeline ran to completion.
    Refreshed,
    /// Another refresh of the same key was in flight.
    Skipped,
    /// An asset did not resolve; the market left public lookup.
    Removed,
    Cancelled,
    /// A store error aborted the pipeline; logged, retried on the next trigger.
    Failed,
}

/// Held for the duration of one refresh. Dropping it, on any exit path,
/// frees the key and leaves the refresh epoch.
struct RefreshPermit {
    keys: Arc<Mutex<HashSet<MarketKey>>>,
    epoch: Arc<watch::Sender<usize>>,
    key: MarketKey,
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
        self.epoch.send_modify(|n| *n = n.saturating_sub(1));
    }
}

pub struct MarketManager {
    log: Arc<dyn TradeLog>,
    registry: MarketRegistry,
    cache: TickerCache,
    candles: CandleBuilder,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    cancel: CancelSignal,

    /// Keys with a refresh in flight.
    in_flight_keys: Arc<Mutex<HashSet<MarketKey>>>,
    /// Count of refreshes in flight across all keys.
    in_flight: Arc<watch::Sender<usize>>,
}

impl MarketManager {
    pub fn new(
        log: Arc<dyn TradeLog>,
        directory: Arc<dyn AssetDirectory>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
        cancel: CancelSignal,
    ) -> Arc<Self> {
        let (epoch_tx, _) = watch::channel(0usize);

        Arc::new(Self {
            registry: MarketRegistry::new(directory, config.market_separator.clone()),
            cache: TickerCache::new(),
            candles: CandleBuilder::new(Arc::clone(&log), Arc::clone(&clock), config.clone()),
            log,
            clock,
            config,
            cancel,
            in_flight_keys: Arc::new(Mutex::new(HashSet::new())),
            in_flight: Arc::new(epoch_tx),
        })
    }

    fn try_begin(&self, key: &MarketKey) -> Option<RefreshPermit> {
        if !self.in_flight_keys.lock().insert(key.clone()) {
            debug!(market = %key, "refresh already in flight, skipping");
            return None;
        }
        self.in_flight.send_modify(|n| *n += 1);

        Some(RefreshPermit {
            keys: Arc::clone(&self.in_flight_keys),
            epoch: Arc::clone(&self.in_flight),
            key: key.clone(),
        })
    }

    /// Refreshes one market and waits for the result. Failures are logged and
    /// reported through the outcome only.
    pub async fn refresh_market(&self, key: &MarketKey) -> RefreshOutcome {
        match self.try_begin(key) {
            Some(permit) => self.run(key, permit).await,
            None => RefreshOutcome::Skipped,
        }
    }

    /// Fire-and-forget refresh. Returns `false` when the trigger collapsed into
    /// a refresh already in flight.
    ///
    /// The key is claimed before this returns, so a read issued right after a
    /// trigger already waits for it.
    pub fn trigger_refresh(self: &Arc<Self>, key: MarketKey) -> bool {
        let Some(permit) = self.try_begin(&key) else {
            return false;
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(&key, permit).await;
        });
        true
    }

    async fn run(&self, key: &MarketKey, _permit: RefreshPermit) -> RefreshOutcome {
        let trace_id = TraceId::new();
        let span = root_span("refresh_market", &trace_id);

        match self.pipeline(key).instrument(span.clone()).await {
            Ok(written) => {
                let _g = span.enter();
                debug!(market = %key, candles = written, "market refreshed");
                RefreshOutcome::Refreshed
            }
            Err(MarketError::AssetUnresolved(asset)) => {
                let _g = span.enter();
                warn!(market = %key, %asset, "asset unresolved, refresh aborted");
                RefreshOutcome::Removed
            }
            Err(MarketError::Cancelled) => {
                let _g = span.enter();
                info!(market = %key, "refresh cancelled");
                RefreshOutcome::Cancelled
            }
            Err(e) => {
                let _g = span.enter();
                error!(market = %key, error = %e, "refresh failed");
                RefreshOutcome::Failed
            }
        }
    }

    async fn pipeline(&self, key: &MarketKey) -> Result<usize, MarketError> {
        self.cancel.check()?;

        let market = match self.registry.refresh_market(key).await? {
            Ok(market) => market,
            Err(missing) => {
                self.cache.remove(key);
                return Err(MarketError::AssetUnresolved(missing));
            }
        };

        let span = market_span("refresh", &key.pool_id, &market.market_name);
        self.rebuild(&market).instrument(span).await
    }

    async fn rebuild(&self, market: &Market) -> Result<usize, MarketError> {
        let now = self.clock.now_ms();
        let log = self.log.as_ref();

        self.cache
            .rebuild_trades(market, log, &self.config, now, &self.cancel)
            .await?;
        self.cache
            .rebuild_ticker(market, log, &self.config, now, &self.cancel)
            .await?;
        self.candles.advance(market, &self.cancel).await
    }

    /// Waits until no refresh is in flight, up to the configured timeout.
    pub async fn wait_idle(&self) -> Result<(), MarketError> {
        let mut rx = self.in_flight.subscribe();
        let drained = tokio::time::timeout(self.config.refresh_wait_timeout, rx.wait_for(|n| *n == 0))
            .await
            .is_ok();

        if !drained {
            warn!(
                in_flight = *self.in_flight.borrow(),
                timeout_ms = self.config.refresh_wait_timeout.as_millis() as u64,
                "readers gave up waiting for refreshes"
            );
            return Err(MarketError::RefreshTimeout);
        }
        Ok(())
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Every market key with at least one recorded trade.
    pub async fn known_markets(&self) -> Result<Vec<MarketKey>, MarketError> {
        Ok(self.log.known_markets().await?)
    }

    pub fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &TickerCache {
        &self.cache
    }

    pub fn log(&self) -> &Arc<dyn TradeLog> {
        &self.log
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }
}
