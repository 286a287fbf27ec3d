//! The retry executor.

use super::circuit::CircuitBreaker;
use super::classify::classify;
use super::policy::RetryPolicy;
use rebound_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::Instrument;

/// Per-call attempt bookkeeping; never shared between calls
struct AttemptContext {
    attempt: u32,
    delay: Duration,
    started: Instant,
}

impl AttemptContext {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            delay: policy.initial_delay,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, policy: &RetryPolicy) {
        self.delay = policy.next_delay(self.delay);
        self.attempt += 1;
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Execute an operation with retry logic.
///
/// The operation is invoked at most `policy.max_retries + 1` times. It must
/// tolerate being invoked more than once.
pub async fn execute_with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    execute_with_retry_until(policy, std::future::pending::<()>(), operation).await
}

/// Execute an operation with retry logic until `cancel` resolves.
///
/// If `cancel` completes while an attempt or a backoff delay is pending, the
/// pending work is dropped and the call fails with [`Error::Cancelled`].
pub async fn execute_with_retry_until<F, Fut, T, C>(
    policy: &RetryPolicy,
    cancel: C,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: Future<Output = ()>,
{
    let span = tracing::info_span!("retry", label = %policy.label);
    let run = run_attempts(policy, cancel, operation);

    match policy.deadline {
        Some(deadline) => match tokio::time::timeout(deadline, run).instrument(span).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation = %policy.label,
                    deadline_ms = deadline.as_millis() as u64,
                    "Retry sequence exceeded its deadline"
                );
                Err(Error::timeout(policy.label.clone(), deadline))
            }
        },
        None => run.instrument(span).await,
    }
}

async fn run_attempts<F, Fut, T, C>(policy: &RetryPolicy, cancel: C, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: Future<Output = ()>,
{
    let mut ctx = AttemptContext::new(policy);
    tokio::pin!(cancel);

    loop {
        let outcome = tokio::select! {
            biased;
            _ = &mut cancel => return Err(cancelled(policy, &ctx)),
            outcome = operation() => outcome,
        };

        let failure = match outcome {
            Ok(value) => {
                if ctx.attempt > 1 {
                    tracing::info!(
                        operation = %policy.label,
                        attempt = ctx.attempt,
                        "Operation recovered on retry"
                    );
                }
                return Ok(value);
            }
            Err(failure) => failure,
        };

        if !classify(&failure, &policy.retry_on) {
            tracing::error!(
                operation = %policy.label,
                attempt = ctx.attempt,
                error = %failure,
                "Operation failed with a non-retryable error"
            );
            return Err(Error::non_retryable(
                policy.label.clone(),
                ctx.attempt,
                ctx.elapsed(),
                failure,
            ));
        }

        if ctx.attempt > policy.max_retries {
            tracing::error!(
                operation = %policy.label,
                attempt = ctx.attempt,
                error = %failure,
                "Operation failed after exhausting its retry budget"
            );
            return Err(Error::exhausted(
                policy.label.clone(),
                ctx.attempt,
                ctx.elapsed(),
                failure,
            ));
        }

        tracing::warn!(
            operation = %policy.label,
            attempt = ctx.attempt,
            max_retries = policy.max_retries,
            delay_ms = ctx.delay.as_millis() as u64,
            error = %failure,
            "Operation failed, retry scheduled"
        );

        if let Some(observer) = &policy.observer {
            observer.on_retry(&failure, ctx.attempt)?;
        }

        tokio::select! {
            biased;
            _ = &mut cancel => return Err(cancelled(policy, &ctx)),
            _ = sleep(ctx.delay) => {}
        }

        ctx.advance(policy);
    }
}

fn cancelled(policy: &RetryPolicy, ctx: &AttemptContext) -> Error {
    tracing::warn!(
        operation = %policy.label,
        attempt = ctx.attempt,
        "Operation cancelled"
    );
    Error::cancelled(policy.label.clone(), ctx.attempt, ctx.elapsed())
}

/// Retry with circuit breaker protection.
///
/// The breaker guards the whole retry sequence: an exhausted sequence is one
/// breaker failure, and an open breaker rejects the call before any attempt.
pub async fn retry_with_circuit_breaker<F, Fut, T>(
    policy: &RetryPolicy,
    circuit_breaker: &CircuitBreaker,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    circuit_breaker
        .execute(move || execute_with_retry(policy, operation))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::FailureKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn reset() -> Error {
        Error::network("api", FailureKind::ConnectionReset, "connection reset by peer")
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failures() {
        let policy = RetryPolicy::default().with_initial_delay(Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));

        let result = execute_with_retry(&policy, || {
            let count = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(reset())
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_max_attempts() {
        let policy = RetryPolicy::default()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(10));
        let counter = AtomicU32::new(0);

        let result: Result<()> = execute_with_retry(&policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(reset()) }
        })
        .await;

        // Initial attempt + 2 retries = 3 total
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            Error::Exhausted {
                attempts, source, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.kind(), FailureKind::ConnectionReset);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_non_retryable_error() {
        let policy = RetryPolicy::for_network().with_max_retries(10);
        let counter = AtomicU32::new(0);

        let result: Result<()> = execute_with_retry(&policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::http_status("api", 400)) }
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::NonRetryable { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_runs_once() {
        let policy = RetryPolicy::default().with_max_retries(0);
        let counter = AtomicU32::new(0);

        let result: Result<()> = execute_with_retry(&policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(reset()) }
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            Error::Exhausted { attempts: 1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_success_sleeps_nothing() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let value = execute_with_retry(&policy, || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_failure_aborts_and_is_not_wrapped() {
        let policy = RetryPolicy::default()
            .with_max_retries(5)
            .with_observer(|_: &Error, attempt: u32| {
                if attempt == 2 {
                    Err(Error::configuration("observer refused"))
                } else {
                    Ok(())
                }
            });
        let counter = AtomicU32::new(0);

        let result: Result<()> = execute_with_retry(&policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(reset()) }
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        match result.unwrap_err() {
            Error::Configuration { message } => assert_eq!(message, "observer refused"),
            other => panic!("expected the observer's error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay() {
        let policy = RetryPolicy::default().with_initial_delay(Duration::from_secs(60));
        let counter = AtomicU32::new(0);

        let start = Instant::now();
        let result: Result<()> = execute_with_retry_until(
            &policy,
            sleep(Duration::from_secs(5)),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(reset()) }
            },
        )
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        match result.unwrap_err() {
            Error::Cancelled { attempts, .. } => assert_eq!(attempts, 1),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_attempt() {
        let policy = RetryPolicy::default();

        let result: Result<()> = execute_with_retry_until(
            &policy,
            sleep(Duration::from_millis(50)),
            || async {
                sleep(Duration::from_secs(3600)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), Error::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_whole_sequence() {
        let policy = RetryPolicy::default()
            .with_max_retries(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_deadline(Duration::from_secs(4))
            .with_label("slow dependency");
        let counter = AtomicU32::new(0);

        let start = Instant::now();
        let result: Result<()> = execute_with_retry(&policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(reset()) }
        })
        .await;

        // Attempts at t=0, 1s, 3s; the next delay (4s) crosses the deadline
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        match result.unwrap_err() {
            Error::Timeout {
                operation,
                duration,
            } => {
                assert_eq!(operation, "slow dependency");
                assert_eq!(duration, Duration::from_secs(4));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
