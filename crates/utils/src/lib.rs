//! Shared resilience utilities for rebound
//!
//! This crate provides the retry executor, the circuit breaker and the
//! tracing setup used by every binary in the workspace.

pub mod resilience;
pub mod tracing;

pub use resilience::*;
