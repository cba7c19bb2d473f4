use std::sync::Arc;

use tokio::sync::watch;

use crate::error::MarketError;

/// Cooperative shutdown flag shared by the engine and the scheduler loops.
///
/// Refreshes check it between store queries; loops `select!` on `cancelled()`.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// `Err(Cancelled)` once `cancel` was called.
    pub fn check(&self) -> Result<(), MarketError> {
        if self.is_cancelled() {
            return Err(MarketError::Cancelled);
        }
        Ok(())
    }

    /// Resolves when `cancel` is called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // the sender lives in `self`, so the only exit is a `true` value
        let _ = rx.wait_for(|c| *c).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_observe_cancellation() {
        let signal = CancelSignal::new();
        let other = signal.clone();
        assert!(signal.check().is_ok());

        let waiter = tokio::spawn(async move { other.cancelled().await });
        signal.cancel();

        waiter.await.unwrap();
        assert!(matches!(signal.check(), Err(MarketError::Cancelled)));
    }
}
