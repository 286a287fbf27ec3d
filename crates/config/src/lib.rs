//! Configuration for rebound
//!
//! Settings are read from an optional JSON file and then overridden by
//! environment variables. They produce named retry policies and the breaker
//! registry used by wiring code.

pub mod loader;
pub mod settings;

pub use loader::{ConfigLoader, CONFIG_PATH_VAR, LOG_LEVEL_VAR};
pub use settings::{BreakerSettings, PolicySettings, Settings};
