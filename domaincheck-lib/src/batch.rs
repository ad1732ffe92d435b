//! Batch orchestration.
//!
//! Runs the resolution engine over up to [`MAX_BATCH_SIZE`] inputs at once.
//! Every input gets its own task, a per-batch semaphore bounds how many are
//! probing at the same time, and one deadline covers the whole batch.
//! Every position always receives a verdict, in input order.

use crate::checker::DomainChecker;
use crate::context::CheckContext;
use crate::error::DomainCheckError;
use crate::normalize::normalize_batch;
use crate::types::{BatchResult, DomainIdentifier, Verdict};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

/// Largest batch accepted by [`check_batch`].
pub const MAX_BATCH_SIZE: usize = 100;

/// Concurrent checks per batch unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Aborts every worker still running when the batch future is dropped.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Check a batch of raw inputs.
///
/// # Errors
///
/// Only request-shape errors, before any probing starts:
/// `EmptyBatch` for no inputs and `TooManyDomains` for more than
/// [`MAX_BATCH_SIZE`]. Everything else is reported per position.
pub async fn check_batch<S: AsRef<str>>(
    checker: &DomainChecker,
    ctx: &CheckContext,
    inputs: &[S],
    max_concurrency: usize,
    overall_timeout: Duration,
) -> Result<BatchResult, DomainCheckError> {
    if inputs.is_empty() {
        return Err(DomainCheckError::EmptyBatch);
    }
    if inputs.len() > MAX_BATCH_SIZE {
        return Err(DomainCheckError::TooManyDomains {
            count: inputs.len(),
            max: MAX_BATCH_SIZE,
        });
    }

    let batch_ctx = ctx.with_timeout(overall_timeout);
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let raw: Vec<String> = inputs.iter().map(|s| s.as_ref().to_string()).collect();
    let normalized = normalize_batch(&raw);

    debug!(
        count = raw.len(),
        concurrency = max_concurrency.max(1),
        timeout = ?overall_timeout,
        "starting batch"
    );

    // Normalized name where there is one, raw input otherwise.
    let displays: Vec<String> = raw
        .iter()
        .zip(&normalized)
        .map(|(input, normalized)| match normalized {
            Ok(domain) => domain.full().to_string(),
            Err(_) => input.clone(),
        })
        .collect();
    let identifiers: Vec<Option<DomainIdentifier>> = normalized
        .iter()
        .map(|normalized| normalized.as_ref().ok().cloned())
        .collect();

    let handles: Vec<JoinHandle<Verdict>> = raw
        .iter()
        .cloned()
        .zip(displays.iter().cloned())
        .zip(normalized)
        .map(|((input, display), normalized)| {
            let checker = checker.clone();
            let ctx = batch_ctx.clone();
            let semaphore = Arc::clone(&semaphore);

            tokio::spawn(async move {
                let started = Instant::now();

                let _permit = tokio::select! {
                    biased;
                    _ = ctx.done() => {
                        return Verdict::failed(
                            display,
                            normalized.ok(),
                            DomainCheckError::Cancelled.to_string(),
                            None,
                            Utc::now(),
                            started.elapsed(),
                        );
                    }
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            return Verdict::failed(
                                display,
                                normalized.ok(),
                                DomainCheckError::Cancelled.to_string(),
                                None,
                                Utc::now(),
                                started.elapsed(),
                            );
                        }
                    },
                };

                match normalized {
                    Ok(domain) => checker.resolve(&ctx, &domain).await,
                    Err(e) => Verdict::failed(
                        input,
                        None,
                        e.to_string(),
                        None,
                        Utc::now(),
                        started.elapsed(),
                    ),
                }
            })
        })
        .collect();

    let guard = AbortOnDrop(handles.iter().map(JoinHandle::abort_handle).collect());

    let mut slots: Vec<Option<Verdict>> = vec![None; handles.len()];
    for (index, handle) in handles.into_iter().enumerate() {
        let verdict = match handle.await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(domain = %displays[index], error = %e, "batch worker failed");
                Verdict::failed(
                    displays[index].clone(),
                    identifiers[index].clone(),
                    DomainCheckError::internal(e.to_string()).to_string(),
                    None,
                    Utc::now(),
                    Duration::ZERO,
                )
            }
        };
        slots[index] = Some(verdict);
    }
    drop(guard);

    let verdicts: Vec<Verdict> = slots.into_iter().flatten().collect();
    let result = BatchResult::from_verdicts(verdicts);
    debug!(
        checked = result.checked(),
        available = result.available(),
        taken = result.taken(),
        errors = result.errors(),
        "batch complete"
    );

    Ok(result)
}

impl DomainChecker {
    /// Check a batch using this checker's configured concurrency and deadline.
    pub async fn check_batch<S: AsRef<str>>(
        &self,
        ctx: &CheckContext,
        inputs: &[S],
    ) -> Result<BatchResult, DomainCheckError> {
        let config = self.config();
        check_batch(
            self,
            ctx,
            inputs,
            config.concurrency,
            config.batch_timeout,
        )
        .await
    }
}
