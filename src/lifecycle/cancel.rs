//! Cancellation scope for network-bound operations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::ledger::types::{LedgerError, LedgerResult};

/// A cancel signal plus an optional deadline.
///
/// Clones share the signal: cancelling any clone cancels all of them.
/// Derived scopes from [`Cancellation::with_timeout`] share the signal but
/// may carry an earlier deadline.
#[derive(Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Create a scope with no deadline.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            deadline: None,
        }
    }

    /// Derive a scope that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            deadline: Some(deadline),
        }
    }

    /// Trigger the cancel signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the scope has already ended.
    pub fn check(&self) -> LedgerResult<()> {
        if self.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Err(LedgerError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolve once the scope ends, with the reason it ended.
    pub async fn cancelled(&self) -> LedgerError {
        let mut rx = self.rx.clone();
        let signal = async move {
            let signalled = rx.wait_for(|cancelled| *cancelled).await.is_ok();
            if !signalled {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(at) => tokio::select! {
                _ = signal => LedgerError::Cancelled,
                _ = sleep_until(at) => LedgerError::DeadlineExceeded,
            },
            None => {
                signal.await;
                LedgerError::Cancelled
            }
        }
    }

    /// Run `fut` unless the scope ends first, in which case `fut` is dropped.
    pub async fn run<F, T>(&self, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            reason = self.cancelled() => Err(reason),
            result = fut => result,
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cancellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancellation")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}
