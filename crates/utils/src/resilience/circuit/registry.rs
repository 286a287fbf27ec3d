//! Breakers keyed by the dependency they protect.

use super::config::CircuitBreakerConfig;
use super::state::CircuitBreaker;
use super::types::CircuitBreakerStats;
use rebound_core::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owned collection of breakers, one per protected dependency.
///
/// Built once by the wiring code and handed to call sites; there is no global
/// instance.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: BTreeMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breaker, replacing any previous breaker with the same name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        config: CircuitBreakerConfig,
    ) -> Result<Arc<CircuitBreaker>> {
        config.validate()?;
        let name = name.into();
        let breaker = Arc::new(CircuitBreaker::new(name.clone(), config));
        self.breakers.insert(name, Arc::clone(&breaker));
        Ok(breaker)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Stats for every breaker, ordered by name
    pub fn stats(&self) -> Vec<CircuitBreakerStats> {
        self.breakers.values().map(|b| b.stats()).collect()
    }
}
