//! Retry policy and the observer hook invoked between attempts.

use super::classify::{classify, Matcher};
use rebound_core::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum number of retries after the first attempt
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (1s)
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Default growth factor between retries
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default diagnostic label
const DEFAULT_LABEL: &str = "operation";

/// Observer notified before each retry sleep.
///
/// Returning an error aborts the retry loop immediately and the error is
/// returned to the caller as-is.
pub trait RetryObserver: Send + Sync {
    /// Called with the failure that triggered the retry and its 1-based attempt number
    fn on_retry(&self, failure: &Error, attempt: u32) -> Result<()>;
}

impl<F> RetryObserver for F
where
    F: Fn(&Error, u32) -> Result<()> + Send + Sync,
{
    fn on_retry(&self, failure: &Error, attempt: u32) -> Result<()> {
        self(failure, attempt)
    }
}

/// Configuration for a single retried call.
///
/// A policy is immutable for the duration of a call; share it by reference or
/// clone it per dependency.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; the attempt budget is `max_retries + 1`
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor applied to the delay after each retryable failure (>= 1.0)
    pub backoff_multiplier: f64,
    /// Retry rules; empty means every failure is retryable
    pub retry_on: Vec<Matcher>,
    /// Hook run between attempts
    pub observer: Option<Arc<dyn RetryObserver>>,
    /// Name used in logs and terminal errors
    pub label: String,
    /// Upper bound on the whole retry sequence, delays included
    pub deadline: Option<Duration>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("retry_on", &self.retry_on)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .field("label", &self.label)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            retry_on: Vec::new(),
            observer: None,
            label: DEFAULT_LABEL.to_string(),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Replace the retry rules
    #[must_use]
    pub fn with_matchers<I, M>(mut self, matchers: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        self.retry_on = matchers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl RetryObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Reject parameters the executor cannot honour
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::configuration(format!(
                "retry policy '{}': backoff multiplier must be a finite number >= 1, got {}",
                self.label, self.backoff_multiplier
            )));
        }
        if self.deadline == Some(Duration::ZERO) {
            return Err(Error::configuration(format!(
                "retry policy '{}': deadline must be greater than zero",
                self.label
            )));
        }
        Ok(())
    }

    /// Check if an error should be retried
    pub fn should_retry(&self, error: &Error) -> bool {
        classify(error, &self.retry_on)
    }

    /// Total number of invocations permitted per call
    pub fn attempt_budget(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after growing `current` by the backoff multiplier.
    ///
    /// Saturates instead of overflowing and never shrinks.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_nanos() as f64 * self.backoff_multiplier;
        // Float to int casts saturate, so huge delays pin at u64::MAX nanoseconds
        Duration::from_nanos(scaled as u64).max(current)
    }

    /// Delay before the retry that follows `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..attempt {
            delay = self.next_delay(delay);
        }
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rebound_core::FailureKind;

    #[test]
    fn default_policy_retries_everything() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.attempt_budget(), 4);
        assert!(policy.should_retry(&Error::configuration("boom")));
    }

    #[test]
    fn delays_follow_exponential_sequence() {
        let policy = RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0);
        let delays: Vec<_> = (1..=4).map(|a| policy.delay_for_attempt(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn fractional_multiplier_grows_gently() {
        let policy = RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(500))
            .with_backoff_multiplier(1.5);
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(750));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_micros(1_125_000));
    }

    #[test]
    fn next_delay_saturates() {
        let policy = RetryPolicy::default().with_backoff_multiplier(1000.0);
        let huge = Duration::from_secs(u64::MAX / 2);
        assert!(policy.next_delay(huge) >= huge);
    }

    #[test]
    fn validate_rejects_shrinking_multiplier() {
        let err = RetryPolicy::default()
            .with_backoff_multiplier(0.5)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("backoff multiplier"));

        assert!(RetryPolicy::default()
            .with_backoff_multiplier(f64::NAN)
            .validate()
            .is_err());
        assert!(RetryPolicy::default()
            .with_deadline(Duration::ZERO)
            .validate()
            .is_err());
        assert!(RetryPolicy::default().validate().is_ok());
    }

    #[test]
    fn closures_are_observers() {
        let policy = RetryPolicy::default().with_observer(|_: &Error, attempt: u32| {
            if attempt > 1 {
                Err(Error::configuration("stop"))
            } else {
                Ok(())
            }
        });
        let observer = policy.observer.as_ref().unwrap();
        let failure = Error::network("api", FailureKind::TimedOut, "slow");
        assert!(observer.on_retry(&failure, 1).is_ok());
        assert!(observer.on_retry(&failure, 2).is_err());
        assert!(format!("{policy:?}").contains("<observer>"));
    }

    proptest! {
        #[test]
        fn delays_never_decrease(
            initial_ms in 0u64..10_000,
            multiplier in 1.0f64..4.0,
            attempts in 1u32..12,
        ) {
            let policy = RetryPolicy::default()
                .with_initial_delay(Duration::from_millis(initial_ms))
                .with_backoff_multiplier(multiplier);
            let mut previous = Duration::ZERO;
            for attempt in 1..=attempts {
                let delay = policy.delay_for_attempt(attempt);
                prop_assert!(delay >= previous);
                previous = delay;
            }
        }
    }
}
