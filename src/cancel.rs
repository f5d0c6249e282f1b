use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation signal and optional deadline threaded through every call.
///
/// Clones share the same signal: cancelling any clone cancels them all. A
/// token built with [`with_timeout`](Self::with_timeout) or
/// [`with_deadline`](Self::with_deadline) also counts as cancelled once the
/// deadline passes.
///
/// ```no_run
/// use std::time::Duration;
/// use proof_sdk::CancelToken;
///
/// let token = CancelToken::with_timeout(Duration::from_secs(30));
/// let handle = token.clone();
/// // elsewhere:
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    signal: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that only fires when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
            deadline: None,
        }
    }

    /// A token that also fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A token that also fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `true` once `cancel` was called or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow() || self.deadline_exceeded()
    }

    /// `true` once the deadline has passed.
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the token is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let mut rx = self.signal.subscribe();
        let signalled = async move {
            // The sender lives as long as `self`, so this only returns once set.
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signalled => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signalled.await,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
