use clap::{Parser, Subcommand, ValueEnum};
use corelib::Period;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodCli {
    Hourly,
    Daily,
}

impl From<PeriodCli> for Period {
    fn from(p: PeriodCli) -> Self {
        match p {
            PeriodCli::Hourly => Period::Hourly,
            PeriodCli::Daily => Period::Daily,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "market-data", version)]
pub struct Cli {
    /// SQLite connection string (overrides DATABASE_URL)
    #[clap(long)]
    pub database_url: Option<String>,

    /// Seconds between full resync sweeps (overrides RESYNC_INTERVAL_SECS)
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub resync_interval_secs: Option<u64>,

    /// Seconds between trade log polls (overrides POLL_INTERVAL_SECS)
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_secs: Option<u64>,

    /// Prefix of trade explorer links (overrides EXPLORER_BASE_URL)
    #[clap(long)]
    pub explorer_base_url: Option<String>,

    /// Emit JSON logs regardless of APP_ENV
    #[clap(long)]
    pub json_logs: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the resync sweep and settlement intake until Ctrl-C
    Run,

    /// Print the ticker of every live market
    Tickers,

    /// Print every resolvable asset keyed by symbol
    Assets,

    /// Print the candles of one market
    Candles {
        #[clap(long)]
        pool: String,

        /// Market name, e.g. GBYTE-USDC
        #[clap(long)]
        market: String,

        #[clap(long, value_enum, default_value = "hourly")]
        period: PeriodCli,

        /// YYYY-MM-DD, YYYY-MM-DDTHH:MM:SSZ or microseconds since epoch
        #[clap(long)]
        start: String,

        /// Inclusive end bound, same formats as --start
        #[clap(long)]
        end: String,
    },
}
