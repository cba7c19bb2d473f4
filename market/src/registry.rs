//! Live markets and the asset metadata they are built from.
//!
//! A market is present iff both of its assets currently resolve. Assets are
//! re-resolved on every refresh so that registry removals take the market
//! out of lookup on the next cycle.

use std::collections::HashMap;
use std::sync::Arc;

use corelib::{Asset, Market, MarketKey};
use parking_lot::RwLock;
use tracing::{debug, warn};
use tradelog::AssetDirectory;

pub struct MarketRegistry {
    directory: Arc<dyn AssetDirectory>,
    separator: String,
    assets: RwLock<HashMap<String, Asset>>,
    markets: RwLock<HashMap<MarketKey, Market>>,
}

impl MarketRegistry {
    pub fn new(directory: Arc<dyn AssetDirectory>, separator: impl Into<String>) -> Self {
        Self {
            directory,
            separator: separator.into(),
            assets: RwLock::new(HashMap::new()),
            markets: RwLock::new(HashMap::new()),
        }
    }

    /// Re-reads one asset from the directory, updating or evicting the cached copy.
    pub async fn refresh_asset(&self, asset_id: &str) -> anyhow::Result<Option<Asset>> {
        let resolved = self.directory.resolve_asset(asset_id).await?;

        let mut assets = self.assets.write();
        match &resolved {
            Some(asset) => {
                assets.insert(asset_id.to_string(), asset.clone());
            }
            None => {
                if assets.remove(asset_id).is_some() {
                    warn!(asset = asset_id, "asset no longer resolvable");
                }
            }
        }
        Ok(resolved)
    }

    /// Creates, updates or removes the market entry for `key`.
    ///
    /// Returns `Err(asset_id)` naming the first leg that does not resolve;
    /// the entry is gone from lookup in that case.
    pub async fn refresh_market(&self, key: &MarketKey) -> anyhow::Result<Result<Market, String>> {
        let base = self.refresh_asset(&key.base).await?;
        let quote = self.refresh_asset(&key.quote).await?;

        let (base, quote) = match (base, quote) {
            (Some(b), Some(q)) => (b, q),
            (None, _) => return Ok(Err(self.drop_market(key, &key.base))),
            (_, None) => return Ok(Err(self.drop_market(key, &key.quote))),
        };

        let market = Market::new(key.clone(), &base, &quote, &self.separator);
        self.markets.write().insert(key.clone(), market.clone());
        Ok(Ok(market))
    }

    fn drop_market(&self, key: &MarketKey, missing: &str) -> String {
        if self.markets.write().remove(key).is_some() {
            debug!(market = %key, missing, "market removed from lookup");
        }
        missing.to_string()
    }

    pub fn get(&self, key: &MarketKey) -> Option<Market> {
        self.markets.read().get(key).cloned()
    }

    /// Every live market carrying this name, ordered by pool.
    pub fn markets_named(&self, name: &str) -> Vec<Market> {
        let mut found: Vec<Market> = self
            .markets
            .read()
            .values()
            .filter(|m| m.market_name == name)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        found
    }

    /// Disambiguates a market name with its pool.
    pub fn resolve(&self, pool_id: &str, name: &str) -> Option<Market> {
        self.markets
            .read()
            .values()
            .find(|m| m.key.pool_id == pool_id && m.market_name == name)
            .cloned()
    }

    pub fn all(&self) -> Vec<Market> {
        let mut all: Vec<Market> = self.markets.read().values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Cached asset, falling back to the directory when it was never seen.
    pub async fn asset(&self, asset_id: &str) -> anyhow::Result<Option<Asset>> {
        if let Some(asset) = self.assets.read().get(asset_id).cloned() {
            return Ok(Some(asset));
        }
        self.refresh_asset(asset_id).await
    }

    pub fn directory(&self) -> &Arc<dyn AssetDirectory> {
        &self.directory
    }
}
