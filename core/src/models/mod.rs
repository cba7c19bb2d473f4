pub mod asset;
pub mod candle;
pub mod market;
pub mod pool;
pub mod ticker;
pub mod trade;

pub use asset::{Asset, NATIVE_ASSET_ID};
pub use candle::{Candle, FeeBreakdown, Period};
pub use market::{Market, MarketKey};
pub use pool::{AccruedProfits, BookLevel, FeeParams, LeveragedPosition, OrderBook, PoolState, ShiftParams};
pub use ticker::Ticker;
pub use trade::{Side, Trade, TradeRow};
