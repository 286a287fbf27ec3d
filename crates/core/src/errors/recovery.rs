//! Recovery suggestions for terminal failures

use super::types::Error;

/// Helper to suggest recovery actions based on error type
pub fn suggest_recovery(error: &Error) -> String {
    match error {
        Error::Network { endpoint, .. } => format!(
            "Network error talking to '{endpoint}': check connectivity to the dependency. \
             If the problem persists, the service may be temporarily unavailable."
        ),
        Error::Storage { .. } => "Storage error: check that the database is reachable and \
             not overloaded. Lock and deadlock errors usually clear on their own."
            .to_string(),
        Error::Provider { provider, .. } => format!(
            "Provider '{provider}' rejected the call: it may be rate limiting or down. \
             Slow down and try again later."
        ),
        Error::Io { .. } => "I/O error: check the connection and local resources.".to_string(),
        Error::Configuration { message } => {
            format!("Configuration error: {message}. Check your rebound settings file.")
        }
        Error::Timeout { .. } => "Operation timed out: the dependency took too long to respond. \
             Try again or raise the deadline if possible."
            .to_string(),
        Error::CircuitOpen { breaker, .. } => format!(
            "Circuit breaker '{breaker}' is open: the dependency has been failing. \
             Calls resume automatically after the cooldown."
        ),
        Error::Exhausted { source, .. } | Error::NonRetryable { source, .. } => {
            suggest_recovery(source)
        }
        Error::Cancelled { .. } => "The call was cancelled before it finished.".to_string(),
        Error::Json { message, .. } => {
            format!("JSON processing error: {message}. Ensure the data is valid JSON.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use std::time::Duration;

    #[test]
    fn test_recovery_suggestions() {
        let test_cases = vec![
            (
                Error::network("api.example.com", FailureKind::ConnectionRefused, "refused"),
                "connectivity",
            ),
            (
                Error::storage("insert", FailureKind::LockTimeout, "lock wait timeout"),
                "database",
            ),
            (Error::configuration("bad multiplier"), "settings file"),
            (
                Error::timeout("operation", Duration::from_secs(30)),
                "timed out",
            ),
            (Error::circuit_open("whatsapp", None), "cooldown"),
        ];

        for (error, expected_keyword) in test_cases {
            let suggestion = suggest_recovery(&error);
            assert!(
                suggestion.to_lowercase().contains(expected_keyword),
                "Suggestion '{suggestion}' should contain '{expected_keyword}'"
            );
        }
    }

    #[test]
    fn wrapped_failures_use_underlying_suggestion() {
        let err = Error::exhausted(
            "send",
            4,
            Duration::from_secs(14),
            Error::provider("whatsapp", FailureKind::RateLimited, "rate-overlimit"),
        );
        assert!(suggest_recovery(&err).contains("rate limiting"));
    }
}
