mod support;

use std::time::Duration;

use corelib::{MarketKey, Period};
use scheduler::{MIN_SWEEP_INTERVAL, ResyncSweep, SweepReport};
use support::*;

#[tokio::test]
async fn sweep_refreshes_every_known_market() {
    let f = fixture(DAY0 + HOUR);
    let a = MarketKey::new("A", "x", "y");
    let b = MarketKey::new("B", "x", "y");
    push_trade(&f.log, &a, "t1", DAY0 + 10);
    push_trade(&f.log, &b, "t2", DAY0 + 20);

    let sweep = ResyncSweep::new(f.manager.clone(), Duration::from_secs(3600));
    let report = sweep.run_once(&f.cancel).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            refreshed: 2,
            ..Default::default()
        }
    );
    assert!(f.manager.cache().ticker(&a).is_some());
    assert!(f.manager.cache().ticker(&b).is_some());
}

#[tokio::test]
async fn quiet_markets_still_gain_candles_each_sweep() {
    let f = fixture(DAY0 + 30 * 60_000);
    let key = MarketKey::new("A", "x", "y");
    push_trade(&f.log, &key, "t1", DAY0 + 10);

    let sweep = ResyncSweep::new(f.manager.clone(), Duration::from_secs(3600));
    sweep.run_once(&f.cancel).await.unwrap();
    assert_eq!(f.log.candles(Period::Hourly, &key).len(), 1);

    f.clock.advance(3 * HOUR);
    sweep.run_once(&f.cancel).await.unwrap();

    let hourly = f.log.candles(Period::Hourly, &key);
    assert_eq!(hourly.len(), 4);
    assert!(hourly[1..].iter().all(|c| c.base_volume == 0.0 && c.close == hourly[0].close));
}

#[tokio::test]
async fn store_failure_surfaces_from_the_sweep() {
    let f = fixture(DAY0);
    f.log.set_failing(true);

    let sweep = ResyncSweep::new(f.manager.clone(), Duration::from_secs(3600));
    assert!(sweep.run_once(&f.cancel).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn sweep_loop_runs_at_start_and_stops_on_cancel() {
    let f = fixture(DAY0 + HOUR);
    let key = MarketKey::new("A", "x", "y");
    push_trade(&f.log, &key, "t1", DAY0 + 10);

    let handle = tokio::spawn(ResyncSweep::new(f.manager.clone(), Duration::from_secs(3600)).run(f.cancel.clone()));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(f.manager.cache().ticker(&key).is_some());

    f.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweep loop did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_raised_to_the_minimum() {
    let f = fixture(DAY0 + HOUR);
    let key = MarketKey::new("A", "x", "y");
    push_trade(&f.log, &key, "t1", DAY0 + 10);

    let sweep = ResyncSweep::new(f.manager.clone(), Duration::ZERO);
    assert_eq!(sweep.every(), MIN_SWEEP_INTERVAL);

    let handle = tokio::spawn(sweep.run(f.cancel.clone()));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(f.manager.cache().ticker(&key).is_some());

    f.cancel.cancel();
    handle.await.unwrap();
}
