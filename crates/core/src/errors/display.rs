//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network {
                endpoint,
                kind,
                message,
            } => {
                write!(f, "network error for '{endpoint}' ({kind}): {message}")
            }
            Error::Storage {
                operation,
                kind,
                message,
            } => {
                write!(f, "storage {operation} failed ({kind}): {message}")
            }
            Error::Provider {
                provider,
                kind,
                message,
            } => {
                write!(f, "provider '{provider}' error ({kind}): {message}")
            }
            Error::Io { operation, source } => {
                write!(f, "I/O {operation} failed: {source}")
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::Timeout {
                operation,
                duration,
            } => {
                write!(f, "operation '{operation}' timed out after {duration:?}")
            }
            Error::NonRetryable {
                label,
                attempts,
                source,
                ..
            } => {
                write!(
                    f,
                    "{label} failed with a non-retryable error after {attempts} attempt(s): {source}"
                )
            }
            Error::Exhausted {
                label,
                attempts,
                elapsed,
                source,
            } => {
                write!(
                    f,
                    "{label} failed after {attempts} attempt(s) in {elapsed:?}: {source}"
                )
            }
            Error::CircuitOpen {
                breaker,
                retry_after,
            } => match retry_after {
                Some(wait) => write!(
                    f,
                    "circuit breaker '{breaker}' is open, next trial in {wait:?}"
                ),
                None => write!(f, "circuit breaker '{breaker}' is open"),
            },
            Error::Cancelled {
                label, attempts, ..
            } => {
                write!(f, "{label} was cancelled during attempt {attempts}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, FailureKind};
    use std::time::Duration;

    #[test]
    fn network_display_includes_kind_and_message() {
        let err = Error::network("api.example.com", FailureKind::ConnectionReset, "socket hang up");
        assert_eq!(
            err.to_string(),
            "network error for 'api.example.com' (ECONNRESET): socket hang up"
        );
    }

    #[test]
    fn exhausted_display_includes_attempts_and_cause() {
        let err = Error::exhausted(
            "fetch",
            4,
            Duration::from_millis(700),
            Error::http_status("api", 503),
        );
        let text = err.to_string();
        assert!(text.starts_with("fetch failed after 4 attempt(s)"));
        assert!(text.contains("HTTP 503"));
    }

    #[test]
    fn circuit_open_display() {
        let err = Error::circuit_open("payments", None);
        assert_eq!(err.to_string(), "circuit breaker 'payments' is open");
    }
}
