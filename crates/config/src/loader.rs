//! Configuration loader for rebound
//!
//! Resolves the settings file, parses it and applies environment overrides.

use crate::settings::Settings;
use rebound_core::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Environment variable naming the settings file
pub const CONFIG_PATH_VAR: &str = "REBOUND_CONFIG";

/// Environment variable overriding the log level
pub const LOG_LEVEL_VAR: &str = "REBOUND_LOG";

/// Configuration loader that handles all startup configuration
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Settings file; falls back to `REBOUND_CONFIG`, then to built-in defaults
    path: Option<PathBuf>,
    /// Whether to read environment overrides
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            path: None,
            use_env: true,
        }
    }

    /// Set the settings file to load
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Ignore environment variables entirely
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load, override and validate the settings
    pub fn load(self) -> Result<Settings> {
        let lookup = |key: &str| {
            if self.use_env {
                std::env::var(key).ok().filter(|v| !v.is_empty())
            } else {
                None
            }
        };

        let path = self
            .path
            .clone()
            .or_else(|| lookup(CONFIG_PATH_VAR).map(PathBuf::from));

        let mut settings = match path {
            Some(path) => read_settings(&path)?,
            None => {
                tracing::debug!("No settings file configured, using defaults");
                Settings::default()
            }
        };

        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            settings.log_level = Some(level);
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
    let settings = Settings::from_json(&text)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}
