//! Market-data aggregation engine.
//!
//! A `MarketManager` keeps, per `(pool, base, quote)` market, a ticker, the
//! recent trades and gap-free hourly/daily candles derived from the trade log.
//! `MarketQueries` is the read surface handed to consumers, and
//! `OrderBookEmulator` turns a pool's pricing curve into synthetic depth.

pub mod cancel;
pub mod candles;
pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod orderbook;
pub mod query;
pub mod registry;
pub mod ticker;

pub use cancel::CancelSignal;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::MarketError;
pub use manager::{MarketManager, RefreshOutcome};
pub use query::MarketQueries;
