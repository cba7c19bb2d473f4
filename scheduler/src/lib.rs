//! Background loops that keep the engine fresh.
//!
//! - `ResyncSweep` re-walks every known market on a fixed cadence so candles
//!   advance through quiet periods.
//! - `TradeLogWatcher` polls the trade log and publishes a notice per market
//!   with new trades.
//! - `run_intake` turns settlement notices into coalesced refreshes.

pub mod intake;
pub mod sweep;
pub mod watcher;

pub use intake::{SettlementNotice, run_intake};
pub use sweep::{MIN_SWEEP_INTERVAL, ResyncSweep, SweepReport};
pub use watcher::TradeLogWatcher;
