//! Failure classification against retry matchers.

use rebound_core::{Error, FailureKind};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A single retry rule.
///
/// Matchers are usually written in configuration as plain strings: a string
/// naming a known [`FailureKind`] becomes [`Matcher::Kind`], anything else is
/// treated as a message substring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Matcher {
    /// Matches failures tagged with this kind
    Kind(FailureKind),
    /// Matches failures whose message contains this text
    MessageContains(String),
}

impl Matcher {
    /// Matcher on a message substring
    pub fn message(text: impl Into<String>) -> Self {
        Matcher::MessageContains(text.into())
    }

    fn matches_parts(&self, kind: FailureKind, message: &str) -> bool {
        match self {
            // Providers often only report the code inside the message text
            Matcher::Kind(expected) => *expected == kind || message.contains(expected.name()),
            Matcher::MessageContains(text) => message.contains(text.as_str()),
        }
    }

    /// Check this matcher against a single failure's kind and message
    pub fn matches(&self, failure: &Error) -> bool {
        self.matches_parts(failure.kind(), &failure.message())
    }
}

impl From<FailureKind> for Matcher {
    fn from(kind: FailureKind) -> Self {
        Matcher::Kind(kind)
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        match value.parse::<FailureKind>() {
            Ok(kind) => Matcher::Kind(kind),
            Err(_) => Matcher::MessageContains(value.to_string()),
        }
    }
}

impl From<String> for Matcher {
    fn from(value: String) -> Self {
        match value.parse::<FailureKind>() {
            Ok(kind) => Matcher::Kind(kind),
            Err(_) => Matcher::MessageContains(value),
        }
    }
}

impl From<Matcher> for String {
    fn from(matcher: Matcher) -> Self {
        matcher.to_string()
    }
}

impl FromStr for Matcher {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Matcher::from(s))
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Kind(kind) => f.write_str(kind.name()),
            Matcher::MessageContains(text) => f.write_str(text),
        }
    }
}

/// Decide whether `failure` is retryable.
///
/// An empty matcher set makes every failure retryable. Otherwise a single
/// matching rule is enough.
pub fn classify(failure: &Error, matchers: &[Matcher]) -> bool {
    if matchers.is_empty() {
        return true;
    }

    let kind = failure.kind();
    let message = failure.message();
    matchers
        .iter()
        .any(|matcher| matcher.matches_parts(kind, &message))
}
