//! Context helpers for results crossing a configuration boundary

use super::types::{Error, Result};

/// Prefix a failure with what the caller was doing.
///
/// The failure becomes [`Error::Configuration`] carrying
/// `"<context>: <original failure>"`, so the context survives into CLI output.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Like [`ResultExt::context`], building the text only on failure
    fn with_context<F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

fn prefixed(context: String, failure: Error) -> Error {
    Error::configuration(format!("{context}: {failure}"))
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| prefixed(context.into(), e.into()))
    }

    fn with_context<F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| prefixed(context(), e.into()))
    }
}
