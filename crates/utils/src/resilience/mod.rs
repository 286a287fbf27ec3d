//! Resilience patterns: retries with exponential backoff and circuit breakers.
//!
//! This module provides mechanisms to run operations against unreliable
//! remote dependencies and to stop calling them while they are unhealthy.
//!
//! ## Key Components
//!
//! - **`classify`**: Decides whether a failure is retryable given a set of
//!   matchers.
//! - **`policy`** / **`presets`**: Retry parameters and the named network,
//!   storage and messaging configurations.
//! - **`retry`**: The attempt loop with exponential backoff, cancellation and an
//!   optional overall deadline.
//! - **`circuit`**: The three-state circuit breaker and a registry of breakers
//!   owned by the wiring code.
//!
//! A breaker wraps a whole retry call, so an exhausted retry sequence counts as
//! a single breaker failure:
//!
//! ```rust,no_run
//! use rebound_utils::resilience::{
//!     retry_with_circuit_breaker, CircuitBreaker, CircuitBreakerConfig, RetryPolicy,
//! };
//!
//! # async fn example() -> rebound_core::Result<String> {
//! let breaker = CircuitBreaker::new("orders-api", CircuitBreakerConfig::default());
//! let policy = RetryPolicy::for_network().with_label("fetch order");
//!
//! retry_with_circuit_breaker(&policy, &breaker, || async {
//!     // Your operation here
//!     Ok("order".to_string())
//! })
//! .await
//! # }
//! ```

pub mod circuit;
pub mod classify;
pub mod policy;
pub mod presets;
pub mod retry;

pub use circuit::{
    BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
pub use classify::{classify, Matcher};
pub use policy::{RetryObserver, RetryPolicy};
pub use presets::Preset;
pub use rebound_core::suggest_recovery;
pub use retry::{execute_with_retry, execute_with_retry_until, retry_with_circuit_breaker};
