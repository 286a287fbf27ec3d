//! Circuit breaker for protecting a single remote dependency.
//!
//! ## Architecture
//!
//! - [`types`] - `CircuitState` and the `CircuitBreakerStats` snapshot
//! - [`config`] - Threshold and cooldown configuration
//! - [`metrics`] - Lock-free call counters
//! - [`transitions`] - The guarded state machine (admission and outcome recording)
//! - [`state`] - The `CircuitBreaker` handle that runs operations
//! - [`registry`] - Breakers keyed by dependency name, owned by wiring code
//!
//! ## State Transitions
//! ```text
//! Closed   -> Open:     consecutive failures reach the threshold
//! Open     -> HalfOpen: a call arrives after the reset timeout (checked lazily)
//! HalfOpen -> Closed:   the single trial call succeeds
//! HalfOpen -> Open:     the trial call fails; the cooldown restarts
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use rebound_utils::resilience::circuit::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> rebound_core::Result<String> {
//! let cb = CircuitBreaker::new("inventory-db", CircuitBreakerConfig::default());
//!
//! let result = cb.execute(|| async {
//!     // Your operation here
//!     Ok("success".to_string())
//! }).await;
//! result
//! # }
//! ```

pub mod config;
pub mod metrics;
pub mod registry;
pub mod state;
pub mod transitions;
pub mod types;

pub use config::CircuitBreakerConfig;
pub use registry::BreakerRegistry;
pub use state::CircuitBreaker;
pub use types::{CircuitBreakerStats, CircuitState};
