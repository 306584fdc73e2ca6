//! Cancellation signal shared by a request, its redirect hops and its handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::FuelError;

/// Cancellation signal for one request.
///
/// Wraps a `CancellationToken` so in-flight I/O can be raced against it, plus a
/// latch that reports which caller performed the cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    token: CancellationToken,
    latched: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation. Returns true only for the call that flipped the latch.
    pub fn cancel(&self) -> bool {
        if self.latched.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// `Err(Cancelled)` if cancellation has been triggered.
    pub fn checkpoint(&self) -> Result<(), FuelError> {
        if self.is_cancelled() {
            Err(FuelError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_cancel_reports_transition() {
        let token = CancelToken::new();
        let shared = token.clone();
        assert!(token.checkpoint().is_ok());
        assert!(shared.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
        assert!(matches!(token.checkpoint(), Err(FuelError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }
}
