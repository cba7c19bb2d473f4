//! Storage seams of the market-data engine.
//!
//! `TradeLog` is the append/query log of settled trades, settlement fees and
//! derived candles. `AssetDirectory` resolves asset ids to symbol and decimals.
//! Both have a SQLite implementation for the service and an in-memory one for
//! tests.

pub mod assets;
pub mod log;
pub mod memory;
pub mod sqlite;

pub use assets::AssetDirectory;
pub use log::{SettlementRecord, TradeLog};
pub use memory::{InMemoryAssets, InMemoryTradeLog};
pub use sqlite::SqliteStore;
