use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::errors::{ProxyError, Result};

/// Cancellation flag plus an optional per-call deadline, threaded through
/// every network-bound call.
///
/// Clones share the same flag, so cancelling any clone cancels them all.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<watch::Sender<bool>>,
    timeout: Option<Duration>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancelled: Arc::new(tx),
            timeout: None,
        }
    }

    /// Same flag, different deadline.
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self {
            cancelled: self.cancelled.clone(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Runs `fut` unless the token is cancelled first or the deadline passes.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(ProxyError::Cancelled(operation.to_string()));
        }

        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(result) => result,
                    Err(_) => {
                        log::warn!("{} timed out after {:?}", operation, limit);
                        Err(ProxyError::TimedOut(operation.to_string()))
                    }
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancelled() => {
                log::info!("{} cancelled", operation);
                Err(ProxyError::Cancelled(operation.to_string()))
            }
            result = bounded => result,
        }
    }
}
