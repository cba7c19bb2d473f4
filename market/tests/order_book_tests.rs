mod support;

use std::sync::Arc;

use corelib::Asset;
use market::orderbook::{OrderBookEmulator, OrderBookError};
use market::{EngineConfig, ManualClock, MarketError, MarketQueries};
use support::*;

fn emulator(max_move: f64) -> OrderBookEmulator {
    OrderBookEmulator::new(
        Arc::new(ConstantProduct::single(pool_state("POOL", 1_000.0, 2_000.0), max_move)),
        Arc::new(ManualClock::new(DAY0)),
        &EngineConfig::default(),
    )
}

#[test]
fn depth_grows_monotonically_on_both_sides() {
    let book = emulator(10.0).emulate("POOL").unwrap();
    assert!(approx(book.mid_price, 2.0));
    assert!(!book.asks.is_empty() && !book.bids.is_empty());

    assert!(book.asks.windows(2).all(|w| w[1].price > w[0].price));
    assert!(book.bids.windows(2).all(|w| w[1].price < w[0].price));
    assert!(book.asks.iter().chain(&book.bids).all(|l| l.size >= 0.0));

    assert!(approx(book.asks[0].price, 2.0 * 1.001));
    assert!(book.asks.last().unwrap().price <= 2.0 * 1.2);
    assert!(book.bids.last().unwrap().price >= 2.0 / 1.2);
}

#[test]
fn every_step_sees_the_same_snapshot() {
    let book = emulator(10.0).emulate("POOL").unwrap();

    // x * y = k: cumulative base at price p is x0 - sqrt(k / p)
    let k = 1_000.0 * 2_000.0;
    let mut cumulative = 0.0;
    for level in &book.asks {
        cumulative += level.size;
        assert!((cumulative - (1_000.0 - (k / level.price).sqrt())).abs() < 1e-6);
    }
}

#[test]
fn leverage_limit_cuts_the_walk_short() {
    let full = emulator(10.0).emulate("POOL").unwrap();
    let capped = emulator(1.05).emulate("POOL").unwrap();

    assert!(capped.asks.len() < full.asks.len());
    assert!(capped.bids.len() < full.bids.len());
    assert!(capped.asks.iter().all(|l| l.price / 2.0 <= 1.05));
}

#[test]
fn unknown_pool_is_a_pricing_error() {
    let err = emulator(10.0).emulate("NOPE").unwrap_err();
    assert!(matches!(err, OrderBookError::Pricing(_)));
}

#[tokio::test]
async fn read_surface_scales_by_asset_decimals() {
    let h = harness(DAY0);
    h.assets.insert(Asset::new("x", "XX", 2));
    h.assets.insert(Asset::new("y", "YY", 0));

    let queries = MarketQueries::new(h.manager.clone()).with_order_book(emulator(10.0));
    let book = queries.get_order_book("POOL").await.unwrap();

    assert_eq!(book.as_of_ms, DAY0);
    assert!(approx(book.mid_price, 200.0));
    assert!(approx(book.asks[0].price, 200.0 * 1.001));

    let raw = emulator(10.0).emulate("POOL").unwrap();
    assert!(approx(book.asks[0].size, raw.asks[0].size / 100.0));
}

#[tokio::test]
async fn missing_pricing_source_reports_unavailable() {
    let h = harness(DAY0);
    let queries = MarketQueries::new(h.manager.clone());

    let err = queries.get_order_book("POOL").await.unwrap_err();
    assert!(matches!(err, MarketError::OrderBookUnavailable(OrderBookError::NotConfigured)));
}
