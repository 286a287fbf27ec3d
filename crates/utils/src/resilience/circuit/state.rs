//! Circuit breaker handle and execution logic.

use super::config::CircuitBreakerConfig;
use super::metrics::BreakerMetrics;
use super::transitions::{Admission, StateTransitions, Ticket};
use super::types::{CircuitBreakerStats, CircuitState};
use rebound_core::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Circuit breaker for one protected dependency.
///
/// Create one per dependency at wiring time and share it (usually behind an
/// `Arc`) with every call site that talks to that dependency. State lives in
/// memory only.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    metrics: Arc<BreakerMetrics>,
    transitions: StateTransitions,
}

/// Reports the outcome of an admitted call; frees an unreported trial slot on drop.
///
/// A cancelled call says nothing about the dependency, so it only gives back
/// its trial slot.
struct Permit<'a> {
    transitions: &'a StateTransitions,
    ticket: Ticket,
    settled: bool,
}

impl Permit<'_> {
    fn settle<T>(mut self, result: &Result<T>) {
        match result {
            Ok(_) => self.transitions.record_success(self.ticket),
            Err(Error::Cancelled { .. }) => self.transitions.release_trial(self.ticket),
            Err(_) => self.transitions.record_failure(self.ticket, Instant::now()),
        }
        self.settled = true;
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.ticket.is_trial() {
            self.transitions.release_trial(self.ticket);
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        let metrics = Arc::new(BreakerMetrics::new());
        let transitions = StateTransitions::new(name.clone(), config, Arc::clone(&metrics));

        Self {
            name,
            config,
            metrics,
            transitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, without evaluating the cooldown.
    ///
    /// An open breaker whose cooldown has elapsed still reports `Open` until a
    /// call arrives and becomes the half-open trial.
    pub fn current_state(&self) -> CircuitState {
        self.transitions.snapshot(Instant::now()).state
    }

    /// Execute an operation through the circuit breaker
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let ticket = match self.transitions.admit(Instant::now()) {
            Admission::Admitted(ticket) => ticket,
            Admission::Rejected { retry_after } => {
                self.metrics.record_rejection();
                tracing::debug!(breaker = %self.name, "Circuit breaker rejected call");
                return Err(Error::circuit_open(self.name.clone(), retry_after));
            }
        };
        self.metrics.record_call();

        let permit = Permit {
            transitions: &self.transitions,
            ticket,
            settled: false,
        };
        let result = operation().await;
        permit.settle(&result);
        result
    }

    /// Force the breaker closed
    pub fn reset(&self) {
        self.transitions.reset();
    }

    /// Get current circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let snapshot = self.transitions.snapshot(Instant::now());
        CircuitBreakerStats {
            name: self.name.clone(),
            state: snapshot.state,
            consecutive_failures: snapshot.consecutive_failures,
            failure_threshold: self.config.failure_threshold,
            total_calls: self.metrics.total_calls(),
            rejected_calls: self.metrics.rejected_calls(),
            trips: self.metrics.trips(),
            retry_after_ms: snapshot.retry_after.map(|d| d.as_millis() as u64),
            last_state_change: snapshot.last_state_change,
            last_failure: snapshot.last_failure,
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.current_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{execute_with_retry_until, RetryPolicy};
    use rebound_core::FailureKind;
    use std::time::Duration;

    fn failing() -> Error {
        Error::network("test", FailureKind::ConnectionRefused, "fail")
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_breaker_opens_on_failures() {
        let config = CircuitBreakerConfig {
            failure_threshold: 3,
            ..Default::default()
        };
        let cb = CircuitBreaker::new("api", config);

        for _ in 0..3 {
            let _: Result<()> = cb.execute(|| async { Err(failing()) }).await;
        }

        assert_eq!(cb.current_state(), CircuitState::Open);

        // Next call should fail immediately
        let result = cb.execute(|| async { Ok("should not execute") }).await;
        let err = result.unwrap_err();
        assert!(err.is_circuit_open());
        assert!(err.to_string().contains("circuit breaker 'api' is open"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_breaker_half_open_recovery() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout: Duration::from_millis(100),
        };
        let cb = CircuitBreaker::new("api", config);

        for _ in 0..2 {
            let _: Result<()> = cb.execute(|| async { Err(failing()) }).await;
        }
        assert_eq!(cb.current_state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(150)).await;

        // Lazy: still reported open until a call arrives
        assert_eq!(cb.current_state(), CircuitState::Open);

        let result = cb
            .execute(|| async {
                assert_eq!(cb.current_state(), CircuitState::HalfOpen);
                Ok("recovered")
            })
            .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(cb.current_state(), CircuitState::Closed);
        assert_eq!(cb.stats().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_breaker_half_open_failure() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout: Duration::from_millis(100),
        };
        let cb = CircuitBreaker::new("api", config);

        for _ in 0..2 {
            let _: Result<()> = cb.execute(|| async { Err(failing()) }).await;
        }

        tokio::time::advance(Duration::from_millis(150)).await;

        // Failure in half-open should reopen with a fresh cooldown
        let _: Result<()> = cb.execute(|| async { Err(failing()) }).await;

        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Open);
        assert_eq!(stats.retry_after_ms, Some(100));
        assert_eq!(stats.trips, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trial_frees_the_slot() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(1),
        };
        let cb = CircuitBreaker::new("api", config);
        let _: Result<()> = cb.execute(|| async { Err(failing()) }).await;
        tokio::time::advance(Duration::from_secs(1)).await;

        // The trial is abandoned mid-flight
        let trial = cb.execute(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });
        let abandoned = tokio::time::timeout(Duration::from_millis(10), trial).await;
        assert!(abandoned.is_err());
        assert_eq!(cb.current_state(), CircuitState::HalfOpen);

        // The next caller becomes the trial
        let result = cb.execute(|| async { Ok(5) }).await;
        assert_eq!(result.unwrap(), 5);
        assert_eq!(cb.current_state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_trial_keeps_breaker_half_open() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(5),
        };
        let cb = CircuitBreaker::new("api", config);
        let _: Result<()> = cb.execute(|| async { Err(failing()) }).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let policy = RetryPolicy::default();
        let cancelled: Result<()> = cb
            .execute(|| {
                execute_with_retry_until(
                    &policy,
                    tokio::time::sleep(Duration::from_millis(10)),
                    || async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(())
                    },
                )
            })
            .await;

        assert!(matches!(cancelled, Err(Error::Cancelled { .. })));
        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::HalfOpen);
        assert_eq!(stats.trips, 1);

        // The slot is free for the next caller
        let result = cb.execute(|| async { Ok("up") }).await;
        assert_eq!(result.unwrap(), "up");
        assert_eq!(cb.current_state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_cancelled_call_is_not_a_failure() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        };
        let cb = CircuitBreaker::new("api", config);

        let policy = RetryPolicy::default();
        let cancelled: Result<()> = cb
            .execute(|| {
                execute_with_retry_until(&policy, std::future::ready(()), || async { Ok(()) })
            })
            .await;

        assert!(matches!(cancelled, Err(Error::Cancelled { .. })));
        assert_eq!(cb.current_state(), CircuitState::Closed);
        assert_eq!(cb.stats().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_stats_serialize_for_health_reporting() {
        let cb = CircuitBreaker::new("db", CircuitBreakerConfig::default());
        let _ = cb.execute(|| async { Ok(()) }).await;
        let json = serde_json::to_value(cb.stats()).unwrap();
        assert_eq!(json["name"], "db");
        assert_eq!(json["state"], "CLOSED");
        assert_eq!(json["total_calls"], 1);
        assert_eq!(json["failure_threshold"], 5);
    }
}
