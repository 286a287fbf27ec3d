//! Error types and result extensions for rebound operations

mod builders;
mod conversions;
mod display;
mod extensions;
mod inspect;
mod recovery;
mod types;

pub use builders::*;
pub use extensions::*;
pub use recovery::suggest_recovery;
pub use types::{Error, Result};
