mod support;

use std::time::Duration;

use corelib::MarketKey;
use market::{EngineConfig, MarketError, MarketQueries, RefreshOutcome};
use support::*;

fn gated_harness(timeout: Duration) -> Harness<GatedLog> {
    let log = GatedLog::new("POOL");
    log.inner.push_trade(trade(&key(), "a", at(10, 0), 1, 20));
    harness_with(log, at(10, 30), EngineConfig::default().with_wait_timeout(timeout))
}

#[tokio::test]
async fn concurrent_triggers_collapse_into_one_refresh() {
    let h = gated_harness(Duration::from_secs(5));

    assert!(h.manager.trigger_refresh(key()));
    assert!(!h.manager.trigger_refresh(key()));
    assert_eq!(h.manager.refresh_market(&key()).await, RefreshOutcome::Skipped);
    assert_eq!(h.manager.in_flight(), 1);

    // other markets are not held up by the busy key
    let other = MarketKey::new("OTHER", "x", "y");
    h.log.inner.push_trade(trade(&other, "o", at(10, 0), 1, 20));
    assert_eq!(h.manager.refresh_market(&other).await, RefreshOutcome::Refreshed);

    h.log.open();
    h.manager.wait_idle().await.unwrap();
    assert_eq!(h.manager.in_flight(), 0);
    assert!(h.manager.cache().ticker(&key()).is_some());

    assert!(h.manager.trigger_refresh(key()));
    h.manager.wait_idle().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn readers_give_up_after_the_wait_timeout() {
    let h = gated_harness(Duration::from_millis(200));
    let queries = MarketQueries::new(h.manager.clone());

    assert!(h.manager.trigger_refresh(key()));
    let res = queries.get_ticker(&key()).await;
    assert!(matches!(res, Err(MarketError::RefreshTimeout)));
    assert!(res.unwrap_err().is_retryable());

    h.log.open();
    let ticker = queries.get_ticker(&key()).await.unwrap();
    assert_eq!(ticker.market_name, "XX-YY");
}

#[tokio::test]
async fn readers_wait_for_a_pending_refresh() {
    let h = harness(at(10, 30));
    h.log.push_trade(trade(&key(), "a", at(10, 0), 1, 20));
    let queries = MarketQueries::new(h.manager.clone());

    assert!(queries.trigger_refresh(key()));
    let ticker = queries.get_ticker(&key()).await.unwrap();
    assert!(approx(ticker.last_price.unwrap(), 2.0));

    let trades = queries.get_recent_trades(&key()).await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].trade_id, "a_0");
}

#[tokio::test]
async fn failed_refresh_releases_the_key() {
    let h = harness(at(10, 30));
    h.log.push_trade(trade(&key(), "a", at(10, 0), 1, 20));

    h.log.set_failing(true);
    assert_eq!(h.manager.refresh_market(&key()).await, RefreshOutcome::Failed);
    assert_eq!(h.manager.in_flight(), 0);

    h.log.set_failing(false);
    assert_eq!(h.manager.refresh_market(&key()).await, RefreshOutcome::Refreshed);
}

#[tokio::test]
async fn unresolvable_asset_removes_the_market_until_it_returns() {
    let h = harness(at(10, 30));
    h.log.push_trade(trade(&key(), "a", at(10, 0), 1, 20));
    let queries = MarketQueries::new(h.manager.clone());

    h.manager.refresh_market(&key()).await;
    assert!(queries.get_ticker(&key()).await.is_ok());
    assert_eq!(queries.markets_named("XX-YY").len(), 1);

    h.assets.remove("y");
    assert_eq!(h.manager.refresh_market(&key()).await, RefreshOutcome::Removed);
    assert!(matches!(queries.get_ticker(&key()).await, Err(MarketError::UnknownMarket(_))));
    assert!(matches!(queries.get_recent_trades(&key()).await, Err(MarketError::UnknownMarket(_))));
    assert!(queries.markets_named("XX-YY").is_empty());
    assert!(h.manager.cache().trades(&key()).is_none());

    h.assets.insert(corelib::Asset::new("y", "YY", 1));
    assert_eq!(h.manager.refresh_market(&key()).await, RefreshOutcome::Refreshed);
    let market = queries.resolve_market("POOL", "XX-YY").await.unwrap();
    assert_eq!(market.key, key());
}

#[tokio::test]
async fn cancelled_engine_stops_refreshing() {
    let h = harness(at(10, 30));
    h.log.push_trade(trade(&key(), "a", at(10, 0), 1, 20));

    h.cancel.cancel();
    assert_eq!(h.manager.refresh_market(&key()).await, RefreshOutcome::Cancelled);
    assert_eq!(h.log.query_count(), 0);
    assert_eq!(h.manager.in_flight(), 0);
}

#[tokio::test]
async fn list_tickers_covers_every_live_market() {
    let h = harness(at(10, 30));
    let other = MarketKey::new("OTHER", "x", "y");
    h.log.push_trade(trade(&key(), "a", at(10, 0), 1, 20));
    h.log.push_trade(trade(&other, "b", at(10, 1), 1, 30));

    for k in h.manager.known_markets().await.unwrap() {
        h.manager.refresh_market(&k).await;
    }

    let queries = MarketQueries::new(h.manager.clone());
    let tickers = queries.list_tickers().await.unwrap();
    let pools: Vec<&str> = tickers.iter().map(|t| t.pool_id.as_str()).collect();
    assert_eq!(pools, vec!["OTHER", "POOL"]);

    let assets = queries.list_assets().await.unwrap();
    assert_eq!(assets.keys().collect::<Vec<_>>(), vec!["GBYTE", "XX", "YY"]);
}
