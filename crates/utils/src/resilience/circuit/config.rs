//! Configuration for circuit breaker behavior.

use rebound_core::{Error, Result};
use std::time::Duration;

/// Default number of consecutive failures before opening
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default cooldown before a trial call is admitted (60s)
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time the circuit stays open before admitting a trial call
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(Error::configuration(
                "circuit breaker failure threshold must be greater than zero",
            ));
        }
        Ok(())
    }
}
