//! SQLite-backed trade log and asset directory.
//!
//! One `SqliteStore` serves both seams over a single `SqlitePool`. Ingestion
//! (`record_trade`, `record_settlement`, `upsert_asset`, `set_supply`) lives
//! here as inherent methods since the engine itself only reads through the
//! traits, apart from writing candles.

mod assets;
mod schema;
mod trades;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `url` and ensures the schema.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "trade log ready");

        Ok(store)
    }

    /// Creates every table and index that does not exist yet.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for ddl in schema::statements() {
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
