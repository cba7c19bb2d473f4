use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for a job (refresh, sweep, read request).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        pool_id = field::Empty,
        market = field::Empty
    )
}

/// Child span scoped to a single market; records the market name on the
/// enclosing root span as well so that logs can be filtered by either.
pub fn market_span(name: &'static str, pool_id: &str, market: &str) -> Span {
    let parent = Span::current();
    parent.record("pool_id", field::display(pool_id));
    parent.record("market", field::display(market));

    tracing::info_span!("market", name = %name, pool_id = %pool_id, market = %market)
}

/// Awaits `fut` and emits a `performance` warning when it took longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
