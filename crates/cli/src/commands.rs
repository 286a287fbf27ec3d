//! Subcommand definitions and dispatch

use crate::simulate::{self, SimulateArgs};
use clap::Subcommand;
use rebound_config::{ConfigLoader, Settings};
use rebound_utils::resilience::{Preset, RetryPolicy};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the built-in retry presets as JSON
    Presets,
    /// Run a simulated flaky dependency through a retry policy and a breaker
    Simulate(SimulateArgs),
    /// Validate a settings file and list what it defines
    CheckConfig {
        /// Settings file to check
        path: PathBuf,
    },
}

/// Serialisable view of a retry policy
#[derive(Serialize)]
pub struct PolicyView {
    pub name: String,
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub retryable: Vec<String>,
    pub deadline_ms: Option<u64>,
}

impl PolicyView {
    pub fn new(name: impl Into<String>, policy: &RetryPolicy) -> Self {
        Self {
            name: name.into(),
            max_retries: policy.max_retries,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            backoff_multiplier: policy.backoff_multiplier,
            retryable: policy.retry_on.iter().map(ToString::to_string).collect(),
            deadline_ms: policy.deadline.map(|d| d.as_millis() as u64),
        }
    }
}

#[derive(Serialize)]
struct ConfigSummary {
    log_level: String,
    policies: Vec<PolicyView>,
    breakers: Vec<String>,
}

impl Commands {
    pub async fn execute(self, settings: &Settings) -> eyre::Result<()> {
        match self {
            Commands::Presets => {
                let views: Vec<_> = Preset::ALL
                    .iter()
                    .map(|preset| PolicyView::new(preset.name(), &preset.policy()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
                Ok(())
            }
            Commands::Simulate(args) => simulate::run(args, settings).await,
            Commands::CheckConfig { path } => {
                let checked = ConfigLoader::new().without_env().path(&path).load()?;
                let policies = checked
                    .policies
                    .keys()
                    .map(|name| Ok(PolicyView::new(name.as_str(), &checked.policy(name)?)))
                    .collect::<rebound_core::Result<Vec<_>>>()?;
                let summary = ConfigSummary {
                    log_level: checked.log_level().to_string(),
                    policies,
                    breakers: checked.breakers.keys().cloned().collect(),
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
                Ok(())
            }
        }
    }
}
