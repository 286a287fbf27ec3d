//! `rebound simulate`: drive a flaky in-process dependency through the
//! retry executor and a circuit breaker.

use crate::commands::PolicyView;
use clap::Args;
use rebound_config::Settings;
use rebound_core::{Error, FailureKind, Result};
use rebound_utils::resilience::{
    execute_with_retry_until, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats,
};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Retry policy: a preset name or a policy from the settings file
    #[arg(long, default_value = "network")]
    pub policy: String,

    /// Invocations that fail before the dependency recovers
    #[arg(long, default_value_t = 2)]
    pub fail_times: u32,

    /// Failure kind the dependency reports
    #[arg(long, default_value = "ECONNRESET")]
    pub failure: FailureKind,

    /// Failure message the dependency reports
    #[arg(long, default_value = "simulated failure")]
    pub message: String,

    /// Number of guarded calls to make
    #[arg(long, default_value_t = 1)]
    pub calls: u32,

    /// Breaker from the settings file to guard the calls with
    #[arg(long)]
    pub breaker: Option<String>,

    /// Failure threshold of the ad-hoc breaker used without --breaker
    #[arg(long, default_value_t = 5)]
    pub breaker_threshold: u32,

    /// Reset timeout of the ad-hoc breaker used without --breaker
    #[arg(long, default_value_t = 60_000)]
    pub reset_timeout_ms: u64,

    /// Factor applied to the policy's initial delay (0 disables sleeping)
    #[arg(long, default_value_t = 1.0)]
    pub delay_scale: f64,
}

/// In-process stand-in for a remote dependency
struct FlakyDependency {
    remaining_failures: AtomicU32,
    invocations: AtomicU32,
    kind: FailureKind,
    message: String,
}

impl FlakyDependency {
    async fn call(&self) -> Result<u32> {
        let invocation = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err(Error::network("simulated", self.kind, self.message.clone()))
        } else {
            Ok(invocation)
        }
    }
}

/// Resolves once `signal` reports an interrupt.
///
/// A listener that could not be installed never resolves, so the calls run to
/// completion instead of being reported as cancelled.
async fn until_interrupted<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!(error = %e, "Unable to listen for Ctrl-C, calls cannot be interrupted");
        std::future::pending::<()>().await;
    }
}

#[derive(Serialize)]
struct CallReport {
    call: u32,
    ok: bool,
    invocation: Option<u32>,
    attempts: Option<u32>,
    error: Option<String>,
    suggestion: Option<String>,
}

#[derive(Serialize)]
struct SimulationReport {
    policy: PolicyView,
    calls: Vec<CallReport>,
    invocations: u32,
    breaker: CircuitBreakerStats,
}

pub async fn run(args: SimulateArgs, settings: &Settings) -> eyre::Result<()> {
    if !args.delay_scale.is_finite() || args.delay_scale < 0.0 {
        eyre::bail!("--delay-scale must be a non-negative number");
    }

    let mut policy = settings.policy(&args.policy)?;
    policy.initial_delay = policy.initial_delay.mul_f64(args.delay_scale);

    let breaker = match &args.breaker {
        Some(name) => settings
            .breaker_registry()?
            .get(name)
            .ok_or_else(|| eyre::eyre!("no breaker named '{name}' in settings"))?,
        None => {
            let config = CircuitBreakerConfig {
                failure_threshold: args.breaker_threshold,
                reset_timeout: Duration::from_millis(args.reset_timeout_ms),
            };
            config.validate()?;
            Arc::new(CircuitBreaker::new("simulated", config))
        }
    };

    let dependency = FlakyDependency {
        remaining_failures: AtomicU32::new(args.fail_times),
        invocations: AtomicU32::new(0),
        kind: args.failure,
        message: args.message.clone(),
    };

    let mut calls = Vec::with_capacity(args.calls as usize);
    for call in 1..=args.calls {
        let interrupted = until_interrupted(tokio::signal::ctrl_c());
        let outcome = breaker
            .execute(|| execute_with_retry_until(&policy, interrupted, || dependency.call()))
            .await;

        tracing::debug!(call, ok = outcome.is_ok(), "Simulated call finished");
        let cancelled = matches!(outcome, Err(Error::Cancelled { .. }));
        calls.push(match outcome {
            Ok(invocation) => CallReport {
                call,
                ok: true,
                invocation: Some(invocation),
                attempts: None,
                error: None,
                suggestion: None,
            },
            Err(err) => CallReport {
                call,
                ok: false,
                invocation: None,
                attempts: err.attempts(),
                suggestion: Some(rebound_core::suggest_recovery(&err)),
                error: Some(err.to_string()),
            },
        });
        if cancelled {
            break;
        }
    }

    let report = SimulationReport {
        policy: PolicyView::new(args.policy.as_str(), &policy),
        calls,
        invocations: dependency.invocations.load(Ordering::SeqCst),
        breaker: breaker.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
