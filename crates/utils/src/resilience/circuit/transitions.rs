//! State transition logic for circuit breaker.
//!
//! All reads and writes of the state, the failure count and the next trial
//! time happen under one mutex. The lock is never held across an `.await`.

use super::config::CircuitBreakerConfig;
use super::metrics::BreakerMetrics;
use super::types::CircuitState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of asking the breaker to run a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may run; report its outcome with this ticket
    Admitted(Ticket),
    /// The call must fail fast
    Rejected { retry_after: Option<Duration> },
}

/// Identifies which state a call was admitted under.
///
/// Outcomes reported with a ticket from an earlier generation are ignored, so a
/// slow call admitted while closed cannot disturb a breaker that has since
/// opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    trial: bool,
}

impl Ticket {
    pub fn is_trial(&self) -> bool {
        self.trial
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    next_attempt: Option<Instant>,
    trial_in_flight: bool,
    generation: u64,
    last_state_change: DateTime<Utc>,
    last_failure: Option<DateTime<Utc>>,
}

/// Snapshot of the guarded fields
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub retry_after: Option<Duration>,
    pub last_state_change: DateTime<Utc>,
    pub last_failure: Option<DateTime<Utc>>,
}

/// Handles state transitions for circuit breaker
pub struct StateTransitions {
    name: String,
    config: CircuitBreakerConfig,
    metrics: Arc<BreakerMetrics>,
    inner: Mutex<Inner>,
}

impl StateTransitions {
    /// Create new state transitions handler
    pub fn new(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        metrics: Arc<BreakerMetrics>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            metrics,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                next_attempt: None,
                trial_in_flight: false,
                generation: 0,
                last_state_change: Utc::now(),
                last_failure: None,
            }),
        }
    }

    /// Decide whether a call arriving at `now` may run.
    ///
    /// An open breaker whose cooldown has elapsed moves to half-open here and
    /// the arriving call becomes the trial. While the trial is in flight every
    /// other caller is rejected.
    pub fn admit(&self, now: Instant) -> Admission {
        let mut inner = self.inner.lock();
        let (state, next_attempt) = (inner.state, inner.next_attempt);
        match state {
            CircuitState::Closed => Admission::Admitted(Ticket {
                generation: inner.generation,
                trial: false,
            }),
            CircuitState::Open => match next_attempt {
                Some(at) if now >= at => {
                    self.enter(&mut inner, CircuitState::HalfOpen);
                    inner.trial_in_flight = true;
                    tracing::info!(
                        breaker = %self.name,
                        "Circuit breaker entering half-open state"
                    );
                    Admission::Admitted(Ticket {
                        generation: inner.generation,
                        trial: true,
                    })
                }
                Some(at) => Admission::Rejected {
                    retry_after: Some(at - now),
                },
                None => Admission::Rejected { retry_after: None },
            },
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return Admission::Rejected { retry_after: None };
                }
                inner.trial_in_flight = true;
                Admission::Admitted(Ticket {
                    generation: inner.generation,
                    trial: true,
                })
            }
        }
    }

    /// Record a successful call and handle state transitions
    pub fn record_success(&self, ticket: Ticket) {
        let mut inner = self.inner.lock();
        if ticket.generation != inner.generation {
            return;
        }

        inner.consecutive_failures = 0;
        if inner.state == CircuitState::HalfOpen {
            tracing::info!(breaker = %self.name, "Circuit breaker closing");
            self.enter(&mut inner, CircuitState::Closed);
        }
    }

    /// Record a failed call and handle state transitions
    pub fn record_failure(&self, ticket: Ticket, now: Instant) {
        let mut inner = self.inner.lock();
        inner.last_failure = Some(Utc::now());
        if ticket.generation != inner.generation {
            return;
        }

        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        let state = inner.state;
        match state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.trip(&mut inner, now);
                }
            }
            // Any failure in half-open state reopens the circuit
            CircuitState::HalfOpen => self.trip(&mut inner, now),
            CircuitState::Open => {}
        }
    }

    /// Free the trial slot of a call that never reported an outcome
    pub fn release_trial(&self, ticket: Ticket) {
        let mut inner = self.inner.lock();
        if ticket.trial
            && ticket.generation == inner.generation
            && inner.state == CircuitState::HalfOpen
        {
            inner.trial_in_flight = false;
        }
    }

    /// Force the breaker closed and forget past failures
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        if inner.state != CircuitState::Closed {
            tracing::info!(breaker = %self.name, "Circuit breaker reset");
            self.enter(&mut inner, CircuitState::Closed);
        }
    }

    pub fn snapshot(&self, now: Instant) -> Snapshot {
        let inner = self.inner.lock();
        let retry_after = match inner.state {
            CircuitState::Open => inner
                .next_attempt
                .map(|at| at.saturating_duration_since(now)),
            _ => None,
        };
        Snapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            retry_after,
            last_state_change: inner.last_state_change,
            last_failure: inner.last_failure,
        }
    }

    fn trip(&self, inner: &mut Inner, now: Instant) {
        self.enter(inner, CircuitState::Open);
        inner.next_attempt = now.checked_add(self.config.reset_timeout);
        self.metrics.record_trip();
        tracing::warn!(
            breaker = %self.name,
            consecutive_failures = inner.consecutive_failures,
            reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
            "Circuit breaker opening"
        );
    }

    fn enter(&self, inner: &mut Inner, state: CircuitState) {
        inner.state = state;
        inner.generation += 1;
        inner.trial_in_flight = false;
        inner.last_state_change = Utc::now();
        if state != CircuitState::Open {
            inner.next_attempt = None;
        }
    }
}
