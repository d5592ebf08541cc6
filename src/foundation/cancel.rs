use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::foundation::error::{PromoError, PromoResult};

/// Cloneable cancellation flag awaited at every suspension point of a run.
///
/// Once cancelled a token stays cancelled; create a fresh one per run.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once [`CancelToken::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot observe a closed channel.
        let _ = rx.wait_for(|c| *c).await;
    }

    /// Drive `fut` to completion unless the token fires first.
    pub async fn run<F: Future>(&self, fut: F) -> PromoResult<F::Output> {
        if self.is_cancelled() {
            return Err(PromoError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(PromoError::Cancelled),
            out = fut => Ok(out),
        }
    }
}
