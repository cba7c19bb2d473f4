use anyhow::Context;
use async_trait::async_trait;
use corelib::{Asset, NATIVE_ASSET_ID};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteStore;
use crate::assets::AssetDirectory;

const ASSET_SELECT: &str = "SELECT a.asset, a.symbol, a.decimals, a.description, s.supply \
                            FROM assets a LEFT JOIN supplies s ON s.asset = a.asset";

fn asset_from_row(row: &SqliteRow) -> anyhow::Result<Asset> {
    let decimals: i64 = row.try_get("decimals").context("assets.decimals")?;

    Ok(Asset {
        id: row.try_get("asset")?,
        symbol: row.try_get("symbol")?,
        decimals: u32::try_from(decimals).context("negative decimals")?,
        description: row.try_get("description")?,
        supply: row.try_get("supply")?,
    })
}

impl SqliteStore {
    /// Inserts or replaces a registry entry.
    pub async fn upsert_asset(&self, asset: &Asset) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (asset, symbol, decimals, description) VALUES (?, ?, ?, ?)
            ON CONFLICT(asset) DO UPDATE SET
                symbol = excluded.symbol,
                decimals = excluded.decimals,
                description = excluded.description
        "#,
        )
        .bind(&asset.id)
        .bind(&asset.symbol)
        .bind(asset.decimals as i64)
        .bind(&asset.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drops an asset whose registry entry disappeared. Trades stay.
    pub async fn remove_asset(&self, asset_id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM assets WHERE asset = ?")
            .bind(asset_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_supply(&self, asset_id: &str, supply: f64) -> anyhow::Result<()> {
        sqlx::query("INSERT OR REPLACE INTO supplies (asset, supply) VALUES (?, ?)")
            .bind(asset_id)
            .bind(supply)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AssetDirectory for SqliteStore {
    async fn resolve_asset(&self, asset_id: &str) -> anyhow::Result<Option<Asset>> {
        let row = sqlx::query(&format!("{ASSET_SELECT} WHERE a.asset = ?"))
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => asset_from_row(&r).map(Some),
            None if asset_id == NATIVE_ASSET_ID => Ok(Some(Asset::native())),
            None => Ok(None),
        }
    }

    async fn list_assets(&self) -> anyhow::Result<Vec<Asset>> {
        let rows = sqlx::query(&format!("{ASSET_SELECT} ORDER BY a.symbol"))
            .fetch_all(&self.pool)
            .await?;

        let mut assets = rows.iter().map(asset_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        if !assets.iter().any(Asset::is_native) {
            assets.push(Asset::native());
        }
        Ok(assets)
    }
}
