//! Tagged failure kinds used for retry classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification tag attached to every failure.
///
/// Each kind has a stable name (see [`FailureKind::name`]) that retry matchers
/// and configuration files refer to. The names follow the socket error codes
/// and provider signals that remote clients commonly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FailureKind {
    /// Peer reset the connection
    ConnectionReset,
    /// Operation timed out
    TimedOut,
    /// Remote end refused the connection
    ConnectionRefused,
    /// No route to host
    HostUnreachable,
    /// Temporary DNS resolution failure
    DnsLookup,
    /// Upstream answered 502
    BadGateway,
    /// Upstream answered 503 or the provider reported itself unavailable
    ServiceUnavailable,
    /// Upstream answered 504
    GatewayTimeout,
    /// An established connection was lost mid-operation
    ConnectionLost,
    /// Storage lock wait timed out
    LockTimeout,
    /// Storage detected a deadlock and rolled back
    Deadlock,
    /// Provider asked us to slow down
    RateLimited,
    /// Provider closed the session
    ConnectionClosed,
    /// Provider reported an internal error
    InternalServerError,
    /// Anything that does not fit the above
    Other,
}

impl FailureKind {
    /// Every kind, in declaration order.
    pub const ALL: [FailureKind; 15] = [
        FailureKind::ConnectionReset,
        FailureKind::TimedOut,
        FailureKind::ConnectionRefused,
        FailureKind::HostUnreachable,
        FailureKind::DnsLookup,
        FailureKind::BadGateway,
        FailureKind::ServiceUnavailable,
        FailureKind::GatewayTimeout,
        FailureKind::ConnectionLost,
        FailureKind::LockTimeout,
        FailureKind::Deadlock,
        FailureKind::RateLimited,
        FailureKind::ConnectionClosed,
        FailureKind::InternalServerError,
        FailureKind::Other,
    ];

    /// Stable name used for matching and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            FailureKind::ConnectionReset => "ECONNRESET",
            FailureKind::TimedOut => "ETIMEDOUT",
            FailureKind::ConnectionRefused => "ECONNREFUSED",
            FailureKind::HostUnreachable => "EHOSTUNREACH",
            FailureKind::DnsLookup => "EAI_AGAIN",
            FailureKind::BadGateway => "BAD_GATEWAY",
            FailureKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            FailureKind::GatewayTimeout => "GATEWAY_TIMEOUT",
            FailureKind::ConnectionLost => "CONNECTION_LOST",
            FailureKind::LockTimeout => "LOCK_TIMEOUT",
            FailureKind::Deadlock => "DEADLOCK",
            FailureKind::RateLimited => "RATE_LIMITED",
            FailureKind::ConnectionClosed => "CONNECTION_CLOSED",
            FailureKind::InternalServerError => "INTERNAL_SERVER_ERROR",
            FailureKind::Other => "OTHER",
        }
    }

    /// Map an HTTP status code onto a kind.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => FailureKind::RateLimited,
            500 => FailureKind::InternalServerError,
            502 => FailureKind::BadGateway,
            503 => FailureKind::ServiceUnavailable,
            504 => FailureKind::GatewayTimeout,
            _ => FailureKind::Other,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FailureKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown failure kind '{s}'"))
    }
}

impl From<FailureKind> for String {
    fn from(kind: FailureKind) -> Self {
        kind.name().to_string()
    }
}

impl TryFrom<String> for FailureKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<std::io::ErrorKind> for FailureKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;
        match kind {
            ErrorKind::ConnectionReset => FailureKind::ConnectionReset,
            ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
            ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe | ErrorKind::NotConnected => {
                FailureKind::ConnectionLost
            }
            ErrorKind::TimedOut | ErrorKind::WouldBlock => FailureKind::TimedOut,
            ErrorKind::AddrNotAvailable => FailureKind::HostUnreachable,
            ErrorKind::UnexpectedEof => FailureKind::ConnectionClosed,
            _ => FailureKind::Other,
        }
    }
}
