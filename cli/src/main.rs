mod cli;
mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use common::logger::init_logger;
use corelib::time::parse_range_bound;
use market::{CancelSignal, MarketManager, MarketQueries, SystemClock};
use scheduler::{ResyncSweep, SettlementNotice, TradeLogWatcher, run_intake};
use tokio::sync::mpsc;
use tracing::info;
use tradelog::SqliteStore;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let cfg = AppConfig::from_env().with_overrides(&args);

    init_logger("market-data", cfg.json_logs);

    let store = Arc::new(
        SqliteStore::connect(&cfg.database_url)
            .await
            .with_context(|| format!("opening {}", cfg.database_url))?,
    );

    let cancel = CancelSignal::new();
    let manager = MarketManager::new(
        store.clone(),
        store,
        Arc::new(SystemClock),
        cfg.engine_config(),
        cancel.clone(),
    );

    match args.command {
        Command::Run => serve(manager, &cfg, cancel).await,
        Command::Tickers => {
            let queries = warmed(manager, &cfg, &cancel).await?;
            print_json(&queries.list_tickers().await?)
        }
        Command::Assets => {
            let queries = MarketQueries::new(manager);
            print_json(&queries.list_assets().await?)
        }
        Command::Candles {
            pool,
            market,
            period,
            start,
            end,
        } => {
            let start_ms = parse_range_bound(&start, false)?;
            let end_ms = parse_range_bound(&end, true)?;

            let queries = warmed(manager, &cfg, &cancel).await?;
            let market = queries.resolve_market(&pool, &market).await?;
            let candles = queries
                .get_candles(&market.key, period.into(), start_ms, end_ms)
                .await?;
            print_json(&candles)
        }
    }
}

/// Runs the background loops until Ctrl-C.
async fn serve(manager: Arc<MarketManager>, cfg: &AppConfig, cancel: CancelSignal) -> anyhow::Result<()> {
    let sweep = ResyncSweep::new(Arc::clone(&manager), cfg.resync_interval);
    let sweep_handle = tokio::spawn(sweep.run(cancel.clone()));

    let (notices, rx) = mpsc::channel::<SettlementNotice>(cfg.intake_capacity);
    let intake_handle = tokio::spawn(run_intake(Arc::clone(&manager), rx, cancel.clone()));

    let watcher = TradeLogWatcher::new(Arc::clone(&manager), cfg.poll_interval);
    let watcher_handle = tokio::spawn(watcher.run(notices, cancel.clone()));

    info!(
        database = %cfg.database_url,
        resync_secs = cfg.resync_interval.as_secs(),
        poll_secs = cfg.poll_interval.as_secs(),
        "market-data engine running"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    cancel.cancel();

    sweep_handle.await?;
    watcher_handle.await?;
    let received = intake_handle.await?;
    manager.wait_idle().await.ok();

    info!(received, "market-data engine stopped");
    Ok(())
}

/// One synchronous sweep so the caches hold every market before reading.
async fn warmed(
    manager: Arc<MarketManager>,
    cfg: &AppConfig,
    cancel: &CancelSignal,
) -> anyhow::Result<MarketQueries> {
    let report = ResyncSweep::new(Arc::clone(&manager), cfg.resync_interval)
        .run_once(cancel)
        .await?;
    info!(
        refreshed = report.refreshed,
        failed = report.failed,
        "warm-up sweep finished"
    );
    Ok(MarketQueries::new(manager))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
