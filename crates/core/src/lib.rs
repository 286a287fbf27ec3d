//! Core domain types and errors for the `rebound` workspace.
//!
//! Every crate in the workspace reports failures through the single [`Error`]
//! enum defined here, so that the retry executor and circuit breaker can make
//! decisions about any operation without knowing which client produced it.
//!
//! ## Key Components
//!
//! - **`errors`**: The primary `Error` enum and `Result` alias, including the
//!   terminal failures produced by the resilience layer (`Exhausted`,
//!   `NonRetryable`, `CircuitOpen`, `Cancelled`).
//! - **`kind`**: `FailureKind`, the tagged classification every error maps to
//!   and that retry matchers are written against.

pub mod errors;
pub mod kind;

pub use self::{
    errors::{suggest_recovery, Error, Result, ResultExt},
    kind::FailureKind,
};
