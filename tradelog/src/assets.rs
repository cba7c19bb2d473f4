use async_trait::async_trait;
use corelib::Asset;

#[async_trait]
pub trait AssetDirectory: Send + Sync {
    /// `None` when the asset is unknown or its registry entry is incomplete.
    async fn resolve_asset(&self, asset_id: &str) -> anyhow::Result<Option<Asset>>;

    async fn list_assets(&self) -> anyhow::Result<Vec<Asset>>;
}
