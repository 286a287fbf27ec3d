//! Named retry policies for the three kinds of remote dependency.
//!
//! Presets are plain data layered on [`RetryPolicy`]; they add no behaviour.

use super::classify::Matcher;
use super::policy::RetryPolicy;
use rebound_core::{Error, FailureKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const NETWORK_KINDS: [FailureKind; 8] = [
    FailureKind::ConnectionReset,
    FailureKind::TimedOut,
    FailureKind::ConnectionRefused,
    FailureKind::HostUnreachable,
    FailureKind::DnsLookup,
    FailureKind::BadGateway,
    FailureKind::ServiceUnavailable,
    FailureKind::GatewayTimeout,
];
const NETWORK_MESSAGES: [&str; 3] = ["socket hang up", "Request failed", "Network error"];

const STORAGE_KINDS: [FailureKind; 4] = [
    FailureKind::ConnectionRefused,
    FailureKind::ConnectionLost,
    FailureKind::LockTimeout,
    FailureKind::Deadlock,
];
const STORAGE_MESSAGES: [&str; 4] = [
    "Connection lost",
    "Connection timeout",
    "Lock wait timeout",
    "Deadlock",
];

const MESSAGING_KINDS: [FailureKind; 5] = [
    FailureKind::RateLimited,
    FailureKind::ConnectionClosed,
    FailureKind::TimedOut,
    FailureKind::ServiceUnavailable,
    FailureKind::InternalServerError,
];
const MESSAGING_MESSAGES: [&str; 3] = ["rate-overlimit", "Connection Closed", "Timed Out"];

fn matchers(kinds: &[FailureKind], messages: &[&str]) -> Vec<Matcher> {
    kinds
        .iter()
        .copied()
        .map(Matcher::Kind)
        .chain(messages.iter().map(|m| Matcher::message(*m)))
        .collect()
}

impl RetryPolicy {
    /// Retry policy for HTTP and socket calls
    pub fn for_network() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            retry_on: matchers(&NETWORK_KINDS, &NETWORK_MESSAGES),
            label: "network call".to_string(),
            ..Default::default()
        }
    }

    /// Retry policy for database and cache calls
    pub fn for_storage() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 1.5,
            retry_on: matchers(&STORAGE_KINDS, &STORAGE_MESSAGES),
            label: "storage call".to_string(),
            ..Default::default()
        }
    }

    /// Retry policy for calls into a messaging provider
    pub fn for_messaging() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            backoff_multiplier: 2.0,
            retry_on: matchers(&MESSAGING_KINDS, &MESSAGING_MESSAGES),
            label: "messaging call".to_string(),
            ..Default::default()
        }
    }
}

/// The named presets, selectable by name from configuration and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Network,
    Storage,
    Messaging,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Network, Preset::Storage, Preset::Messaging];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Network => "network",
            Preset::Storage => "storage",
            Preset::Messaging => "messaging",
        }
    }

    /// A fresh policy carrying this preset's parameters
    pub fn policy(self) -> RetryPolicy {
        match self {
            Preset::Network => RetryPolicy::for_network(),
            Preset::Storage => RetryPolicy::for_storage(),
            Preset::Messaging => RetryPolicy::for_messaging(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "unknown retry preset '{s}', expected one of network, storage, messaging"
                ))
            })
    }
}
