//! Settings schema and conversion into resilience types

use rebound_core::{Error, Result};
use rebound_utils::resilience::{
    BreakerRegistry, CircuitBreakerConfig, Matcher, Preset, RetryPolicy,
};
use rebound_utils::tracing::is_valid_level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Fallback when no valid log level is configured
const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Log level name (`error`, `warn`, `info`, `debug`, `trace`, `off`)
    pub log_level: Option<String>,
    /// Retry policies keyed by dependency name
    pub policies: BTreeMap<String, PolicySettings>,
    /// Circuit breakers keyed by dependency name
    pub breakers: BTreeMap<String, BreakerSettings>,
}

/// One retry policy; unset fields come from `preset` or the default policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySettings {
    pub preset: Option<Preset>,
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    /// Replaces the preset's matchers when present
    pub retryable: Option<Vec<Matcher>>,
    pub deadline_ms: Option<u64>,
}

/// One circuit breaker; unset fields use the breaker defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerSettings {
    pub failure_threshold: Option<u32>,
    pub reset_timeout_ms: Option<u64>,
}

impl PolicySettings {
    /// Build the policy, labelled with the dependency name
    pub fn to_policy(&self, name: &str) -> Result<RetryPolicy> {
        let mut policy = self
            .preset
            .map(Preset::policy)
            .unwrap_or_default()
            .with_label(name);

        if let Some(max_retries) = self.max_retries {
            policy.max_retries = max_retries;
        }
        if let Some(ms) = self.initial_delay_ms {
            policy.initial_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = self.backoff_multiplier {
            policy.backoff_multiplier = multiplier;
        }
        if let Some(retryable) = &self.retryable {
            policy.retry_on = retryable.clone();
        }
        if let Some(ms) = self.deadline_ms {
            policy.deadline = Some(Duration::from_millis(ms));
        }

        policy.validate()?;
        Ok(policy)
    }
}

impl BreakerSettings {
    pub fn to_config(&self) -> Result<CircuitBreakerConfig> {
        let mut config = CircuitBreakerConfig::default();
        if let Some(threshold) = self.failure_threshold {
            config.failure_threshold = threshold;
        }
        if let Some(ms) = self.reset_timeout_ms {
            config.reset_timeout = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Effective log level; an unknown name falls back to `info` with a warning
    pub fn log_level(&self) -> &str {
        match self.log_level.as_deref() {
            Some(level) if is_valid_level(level) => level,
            Some(level) => {
                tracing::warn!(
                    configured = level,
                    "Invalid log level, using '{DEFAULT_LOG_LEVEL}'"
                );
                DEFAULT_LOG_LEVEL
            }
            None => DEFAULT_LOG_LEVEL,
        }
    }

    /// Policy for a dependency.
    ///
    /// Falls back to the preset of the same name when the file does not define
    /// one, so `network`, `storage` and `messaging` always resolve.
    pub fn policy(&self, name: &str) -> Result<RetryPolicy> {
        if let Some(settings) = self.policies.get(name) {
            return settings.to_policy(name);
        }
        match name.parse::<Preset>() {
            Ok(preset) => Ok(preset.policy()),
            Err(_) => Err(Error::configuration(format!(
                "no retry policy named '{name}'"
            ))),
        }
    }

    /// Build every configured breaker
    pub fn breaker_registry(&self) -> Result<BreakerRegistry> {
        let mut registry = BreakerRegistry::new();
        for (name, settings) in &self.breakers {
            registry.register(name.clone(), settings.to_config()?)?;
        }
        Ok(registry)
    }

    /// Check every policy and breaker without keeping the results
    pub fn validate(&self) -> Result<()> {
        for (name, settings) in &self.policies {
            settings.to_policy(name)?;
        }
        for (name, settings) in &self.breakers {
            settings
                .to_config()
                .map_err(|e| Error::configuration(format!("breaker '{name}': {e}")))?;
        }
        Ok(())
    }
}
