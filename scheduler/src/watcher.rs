use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use corelib::{MarketKey, TradeRow};
use market::{CancelSignal, MarketError, MarketManager};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};
use tradelog::TradeLog;

use crate::intake::SettlementNotice;
use crate::sweep::MIN_SWEEP_INTERVAL;

/// Newest trade seen for a market.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TradeMark {
    ts_ms: i64,
    trade_ref: String,
    sub_index: u32,
}

impl From<&TradeRow> for TradeMark {
    fn from(row: &TradeRow) -> Self {
        Self {
            ts_ms: row.ts_ms,
            trade_ref: row.trade_ref.clone(),
            sub_index: row.sub_index,
        }
    }
}

/// Polls the trade log and emits a `SettlementNotice` for every market whose
/// newest trade changed since the previous poll.
///
/// The first poll only records a baseline: the resync sweep already covers
/// every market once at start-up.
pub struct TradeLogWatcher {
    manager: Arc<MarketManager>,
    every: Duration,
    last_seen: HashMap<MarketKey, TradeMark>,
    primed: bool,
}

impl TradeLogWatcher {
    pub fn new(manager: Arc<MarketManager>, every: Duration) -> Self {
        Self {
            manager,
            every: every.max(MIN_SWEEP_INTERVAL),
            last_seen: HashMap::new(),
            primed: false,
        }
    }

    /// One pass over every known market. Returns the number of notices sent.
    pub async fn poll_once(&mut self, tx: &mpsc::Sender<SettlementNotice>) -> Result<usize, MarketError> {
        let keys = self.manager.known_markets().await?;
        let mut sent = 0;

        for key in keys {
            let Some(last) = self.manager.log().last_trade(&key).await? else {
                continue;
            };

            let mark = TradeMark::from(&last);
            if self.last_seen.get(&key) == Some(&mark) {
                continue;
            }
            self.last_seen.insert(key.clone(), mark);

            if self.primed {
                debug!(market = %key, ts_ms = last.ts_ms, "new trades observed");
                if tx.send(SettlementNotice::from(key)).await.is_err() {
                    break;
                }
                sent += 1;
            }
        }

        self.primed = true;
        Ok(sent)
    }

    /// Polls every `every` until `cancel` fires or the intake hangs up.
    pub async fn run(mut self, tx: mpsc::Sender<SettlementNotice>, cancel: CancelSignal) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every_secs = self.every.as_secs(), "trade log watcher started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.poll_once(&tx).await {
                error!(error = %e, "trade log poll failed");
            }
            if tx.is_closed() {
                break;
            }
        }

        info!("trade log watcher stopped");
    }
}
