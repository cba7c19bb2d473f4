use std::time::Duration;

use corelib::time::DAY_MS;
use serde::{Deserialize, Serialize};

/// Tunables of the engine. `Default` carries the production values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trailing window of the ticker statistics and the trade cache.
    pub trade_window_ms: i64,

    /// Longest a read waits for in-flight refreshes before giving up with a
    /// retryable `RefreshTimeout`.
    pub refresh_wait_timeout: Duration,

    /// Store round-trips slower than this are logged on the `performance` target.
    pub slow_query_threshold: Duration,

    /// First order-book level sits at `mid * first_offset` (asks) or
    /// `mid / first_offset` (bids).
    pub book_first_offset: f64,

    /// Ratio between consecutive order-book levels.
    pub book_step_ratio: f64,

    /// Walks stop beyond `mid * depth_range` and below `mid / depth_range`.
    pub book_depth_range: f64,

    /// Joins base and quote symbols into a market name.
    pub market_separator: String,

    /// Prefix of the explorer link attached to cached trades.
    pub explorer_base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trade_window_ms: DAY_MS,
            refresh_wait_timeout: Duration::from_secs(10),
            slow_query_threshold: Duration::from_millis(250),
            book_first_offset: 1.001,
            book_step_ratio: 1.002,
            book_depth_range: 1.2,
            market_separator: "-".to_string(),
            explorer_base_url: None,
        }
    }
}

impl EngineConfig {
    pub fn with_explorer(mut self, base_url: impl Into<String>) -> Self {
        self.explorer_base_url = Some(base_url.into());
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_wait_timeout = timeout;
        self
    }

    pub fn explorer_link(&self, trade_ref: &str) -> Option<String> {
        self.explorer_base_url
            .as_ref()
            .map(|base| format!("{base}{trade_ref}"))
    }
}
