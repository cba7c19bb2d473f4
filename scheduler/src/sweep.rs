use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, root_span};
use market::{CancelSignal, MarketError, MarketManager, RefreshOutcome};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, info, warn};

/// Shortest cadence the sweep accepts; `tokio::time::interval` rejects zero.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Tally of one sweep over every known market.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub refreshed: usize,
    pub skipped: usize,
    pub removed: usize,
    pub failed: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Refreshed => self.refreshed += 1,
            RefreshOutcome::Skipped => self.skipped += 1,
            RefreshOutcome::Removed => self.removed += 1,
            RefreshOutcome::Failed | RefreshOutcome::Cancelled => self.failed += 1,
        }
    }
}

pub struct ResyncSweep {
    manager: Arc<MarketManager>,
    every: Duration,
}

impl ResyncSweep {
    pub fn new(manager: Arc<MarketManager>, every: Duration) -> Self {
        if every < MIN_SWEEP_INTERVAL {
            warn!(
                requested_ms = every.as_millis() as u64,
                "resync interval too short, using the minimum"
            );
        }
        Self {
            manager,
            every: every.max(MIN_SWEEP_INTERVAL),
        }
    }

    pub fn every(&self) -> Duration {
        self.every
    }

    /// Refreshes every market with recorded trades, one after another.
    pub async fn run_once(&self, cancel: &CancelSignal) -> Result<SweepReport, MarketError> {
        let trace_id = TraceId::new();
        let span = root_span("resync_sweep", &trace_id);

        async {
            let keys = self.manager.known_markets().await?;
            let mut report = SweepReport::default();

            for key in &keys {
                cancel.check()?;
                report.record(self.manager.refresh_market(key).await);
            }

            info!(
                markets = keys.len(),
                refreshed = report.refreshed,
                skipped = report.skipped,
                removed = report.removed,
                failed = report.failed,
                "resync sweep finished"
            );
            Ok::<_, MarketError>(report)
        }
        .instrument(span)
        .await
    }

    /// Sweeps immediately, then every `every`, until `cancel` fires.
    pub async fn run(self, cancel: CancelSignal) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every_secs = self.every.as_secs(), "resync sweep started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.run_once(&cancel).await {
                Ok(_) => {}
                Err(MarketError::Cancelled) => break,
                Err(e) => error!(error = %e, "resync sweep failed"),
            }
        }

        info!("resync sweep stopped");
    }
}
