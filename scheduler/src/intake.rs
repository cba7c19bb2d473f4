use std::sync::Arc;

use corelib::MarketKey;
use market::{CancelSignal, MarketManager};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Emitted by the ledger watcher once a pool settlement touching a market is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementNotice {
    pub pool_id: String,
    pub base: String,
    pub quote: String,
}

impl SettlementNotice {
    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.pool_id.clone(), self.base.clone(), self.quote.clone())
    }
}

impl From<MarketKey> for SettlementNotice {
    fn from(key: MarketKey) -> Self {
        Self {
            pool_id: key.pool_id,
            base: key.base,
            quote: key.quote,
        }
    }
}

/// Consumes notices until the channel closes or `cancel` fires. Each notice
/// fires a fire-and-forget refresh; notices for a market already refreshing
/// are dropped. Returns the number of notices received.
pub async fn run_intake(
    manager: Arc<MarketManager>,
    mut rx: mpsc::Receiver<SettlementNotice>,
    cancel: CancelSignal,
) -> usize {
    let mut received = 0;

    loop {
        let notice = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(n) => n,
                None => break,
            },
        };

        received += 1;
        let key = notice.key();
        if !manager.trigger_refresh(key.clone()) {
            debug!(market = %key, "refresh already in flight, notice coalesced");
        }
    }

    info!(received, "settlement intake stopped");
    received
}
