//! Accessors used by the resilience layer and by callers deciding what to surface

use super::types::Error;
use crate::kind::FailureKind;
use std::borrow::Cow;
use std::time::Duration;

impl Error {
    /// Classification tag for this failure.
    ///
    /// Wrapped retry failures report the kind of the failure they carry so that
    /// an outer retry loop classifies them the same way the inner one did.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Network { kind, .. }
            | Error::Storage { kind, .. }
            | Error::Provider { kind, .. } => *kind,
            Error::Io { source, .. } => source.kind().into(),
            Error::Timeout { .. } => FailureKind::TimedOut,
            Error::NonRetryable { source, .. } | Error::Exhausted { source, .. } => source.kind(),
            Error::Json { .. }
            | Error::Configuration { .. }
            | Error::CircuitOpen { .. }
            | Error::Cancelled { .. } => FailureKind::Other,
        }
    }

    /// True when a breaker rejected the call without running it
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Error::CircuitOpen { .. })
    }

    /// Number of attempts made, when the error came out of a retry loop
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::NonRetryable { attempts, .. }
            | Error::Exhausted { attempts, .. }
            | Error::Cancelled { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Time spent in the retry loop, when the error came out of one
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Error::NonRetryable { elapsed, .. }
            | Error::Exhausted { elapsed, .. }
            | Error::Cancelled { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }

    /// The failure's own message, without the variant prefix or the target name.
    ///
    /// Retry wrappers report the message of the failure they carry. Variants
    /// without a message field fall back to their display text.
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            Error::Network { message, .. }
            | Error::Storage { message, .. }
            | Error::Provider { message, .. }
            | Error::Json { message, .. }
            | Error::Configuration { message } => Cow::Borrowed(message),
            Error::Io { source, .. } => Cow::Owned(source.to_string()),
            Error::NonRetryable { source, .. } | Error::Exhausted { source, .. } => {
                source.message()
            }
            Error::Timeout { .. } | Error::CircuitOpen { .. } | Error::Cancelled { .. } => {
                Cow::Owned(self.to_string())
            }
        }
    }
}
