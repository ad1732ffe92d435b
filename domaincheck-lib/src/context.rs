//! Deadline and cancellation carried through every check.
//!
//! A `CheckContext` is cheap to clone. Clones and children created with
//! [`CheckContext::with_timeout`] share one cancellation signal, so
//! cancelling a batch reaches every in-flight domain check.

use crate::error::DomainCheckError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CheckContext {
    deadline: Option<Instant>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Default for CheckContext {
    fn default() -> Self {
        Self::background()
    }
}

impl CheckContext {
    /// A context with no deadline that is only done when cancelled.
    pub fn background() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            deadline: None,
            cancel: Arc::new(tx),
        }
    }

    /// Derive a context that expires after `timeout` or at the parent's
    /// deadline, whichever comes first. Cancellation is shared with the parent.
    ///
    /// A timeout too large to represent as an instant adds no deadline of its
    /// own, so the parent's deadline (if any) still applies.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(candidate)) => Some(parent.min(candidate)),
            (parent, candidate) => parent.or(candidate),
        };
        Self {
            deadline,
            cancel: Arc::clone(&self.cancel),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Signal cancellation to this context and everything sharing it.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// True once the context was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline_exceeded()
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Resolves when the context is explicitly cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> DomainCheckError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancelled().await,
        }
        DomainCheckError::Cancelled
    }

    /// Run `fut` unless the context finishes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, DomainCheckError>
    where
        F: Future<Output = Result<T, DomainCheckError>>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_is_not_done() {
        let ctx = CheckContext::background();
        assert!(!ctx.is_done());
        assert!(ctx.remaining().is_none());
    }

    #[tokio::test]
    async fn test_cancel_reaches_children() {
        let parent = CheckContext::background();
        let child = parent.with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(matches!(child.done().await, DomainCheckError::Cancelled));
    }

    #[tokio::test]
    async fn test_child_deadline_never_exceeds_parent() {
        let parent = CheckContext::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_keeps_parent_deadline() {
        let unbounded = CheckContext::background().with_timeout(Duration::MAX);
        assert!(unbounded.deadline().is_none());
        assert!(!unbounded.is_done());

        let parent = CheckContext::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn test_run_stops_at_deadline() {
        let ctx = CheckContext::background().with_timeout(Duration::from_millis(50));
        let result: Result<(), _> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(DomainCheckError::Cancelled)));
        assert!(ctx.deadline_exceeded());
    }

    #[tokio::test]
    async fn test_run_returns_future_result() {
        let ctx = CheckContext::background();
        let value = ctx.run(async { Ok::<_, DomainCheckError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
