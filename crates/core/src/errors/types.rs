//! Core error type definitions

use crate::kind::FailureKind;
use std::time::Duration;

/// Result type alias for rebound operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rebound operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network call (HTTP, socket) failed
    Network {
        endpoint: String,
        kind: FailureKind,
        message: String,
    },

    /// A storage call (database, cache) failed
    Storage {
        operation: String,
        kind: FailureKind,
        message: String,
    },

    /// A call into an external messaging provider failed
    Provider {
        provider: String,
        kind: FailureKind,
        message: String,
    },

    /// Raw I/O failure surfaced by a client
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    Configuration { message: String },

    /// Operation timeout errors
    Timeout { operation: String, duration: Duration },

    /// The failure did not match any retry rule and surfaced on first occurrence
    NonRetryable {
        label: String,
        attempts: u32,
        elapsed: Duration,
        #[source]
        source: Box<Error>,
    },

    /// The retry budget was consumed; `source` is the last underlying failure
    Exhausted {
        label: String,
        attempts: u32,
        elapsed: Duration,
        #[source]
        source: Box<Error>,
    },

    /// A circuit breaker short-circuited the call; the operation never ran
    CircuitOpen {
        breaker: String,
        retry_after: Option<Duration>,
    },

    /// The caller abandoned the call while it was in flight
    Cancelled {
        label: String,
        attempts: u32,
        elapsed: Duration,
    },
}
