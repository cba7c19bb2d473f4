use std::time::Duration;

use market::EngineConfig;
use tracing::warn;

use crate::cli::Cli;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Cadence of the full resync sweep. Also what keeps hourly candles
    /// advancing for markets without trades.
    pub resync_interval: Duration,

    /// How often the trade log is polled for new trades.
    pub poll_interval: Duration,

    /// Prefix of explorer links attached to cached trades.
    pub explorer_base_url: Option<String>,

    /// Capacity of the settlement notice channel.
    pub intake_capacity: usize,

    /// JSON logs instead of pretty ones.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://market_data.db".to_string());

        Self {
            database_url,
            resync_interval: interval_secs(
                "RESYNC_INTERVAL_SECS",
                std::env::var("RESYNC_INTERVAL_SECS").ok().as_deref(),
                DEFAULT_RESYNC_SECS,
            ),
            poll_interval: interval_secs(
                "POLL_INTERVAL_SECS",
                std::env::var("POLL_INTERVAL_SECS").ok().as_deref(),
                DEFAULT_POLL_SECS,
            ),
            explorer_base_url: std::env::var("EXPLORER_BASE_URL").ok(),
            intake_capacity: 1_024,
            json_logs: std::env::var("APP_ENV").unwrap_or_default() == "production",
        }
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(secs) = cli.resync_interval_secs {
            self.resync_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.poll_interval_secs {
            self.poll_interval = Duration::from_secs(secs);
        }
        if let Some(url) = &cli.explorer_base_url {
            self.explorer_base_url = Some(url.clone());
        }
        self.json_logs |= cli.json_logs;
        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::default();
        match &self.explorer_base_url {
            Some(url) => config.with_explorer(url.clone()),
            None => config,
        }
    }
}

const DEFAULT_RESYNC_SECS: u64 = 3_600;
const DEFAULT_POLL_SECS: u64 = 10;

/// Unset falls back silently; zero or garbage falls back with a warning.
fn interval_secs(var: &'static str, raw: Option<&str>, default: u64) -> Duration {
    let secs = match raw.map(|v| v.trim().parse::<u64>()) {
        None => default,
        Some(Ok(secs)) if secs > 0 => secs,
        Some(_) => {
            warn!(var, value = ?raw, default, "invalid interval, using default");
            default
        }
    };
    Duration::from_secs(secs)
}
