//! Core types for circuit breaker functionality.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Circuit is closed - requests pass through normally
    Closed,
    /// Circuit is open - requests fail immediately
    Open,
    /// Circuit is half-open - a single trial request tests recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        })
    }
}

/// Point-in-time view of a breaker, for health and metrics reporting
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub total_calls: u64,
    pub rejected_calls: u64,
    pub trips: u64,
    /// Milliseconds until an open breaker admits a trial call
    pub retry_after_ms: Option<u64>,
    pub last_state_change: DateTime<Utc>,
    pub last_failure: Option<DateTime<Utc>>,
}
