//! Domain types shared by the market-data workspace.
//!
//! Nothing in here performs I/O; the crate only describes assets, markets,
//! trades, candles, tickers and pool snapshots, plus the decimal-scaling and
//! time helpers every other crate must agree on.

pub mod models;
pub mod scaling;
pub mod time;

pub use models::*;
pub use time::{RangeParseError, TimeRange};
