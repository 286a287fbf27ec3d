//! Builder methods for creating errors with context

use super::types::Error;
use crate::kind::FailureKind;
use std::time::Duration;

impl Error {
    /// Create a network error
    #[must_use]
    pub fn network(
        endpoint: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create a network error from an HTTP status code
    #[must_use]
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            kind: FailureKind::from_http_status(status),
            message: format!("HTTP {status}"),
        }
    }

    /// Create a storage error
    #[must_use]
    pub fn storage(
        operation: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Error::Storage {
            operation: operation.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create a messaging provider error
    #[must_use]
    pub fn provider(
        provider: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Error::Provider {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create an I/O error with the operation that failed
    #[must_use]
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Wrap a failure that was not eligible for retry
    #[must_use]
    pub fn non_retryable(
        label: impl Into<String>,
        attempts: u32,
        elapsed: Duration,
        source: Error,
    ) -> Self {
        Error::NonRetryable {
            label: label.into(),
            attempts,
            elapsed,
            source: Box::new(source),
        }
    }

    /// Wrap the last failure of a retry sequence that ran out of budget
    #[must_use]
    pub fn exhausted(
        label: impl Into<String>,
        attempts: u32,
        elapsed: Duration,
        source: Error,
    ) -> Self {
        Error::Exhausted {
            label: label.into(),
            attempts,
            elapsed,
            source: Box::new(source),
        }
    }

    /// Create a fail-fast error for an open circuit
    #[must_use]
    pub fn circuit_open(breaker: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Error::CircuitOpen {
            breaker: breaker.into(),
            retry_after,
        }
    }

    /// Create a cancellation error
    #[must_use]
    pub fn cancelled(label: impl Into<String>, attempts: u32, elapsed: Duration) -> Self {
        Error::Cancelled {
            label: label.into(),
            attempts,
            elapsed,
        }
    }
}
