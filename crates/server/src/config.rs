//! Engine configuration.
//!
//! Loaded once at process start, validated, and shared by reference.
//! Nothing here is mutated after load, which keeps concurrent request
//! handling lock-free.

use pipeline::{SignalWeights, WeightError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised when validating the engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `timeout_ms` must be strictly positive
    #[error("timeout_ms must be > 0")]
    ZeroTimeout,

    /// `default_limit` must be strictly positive
    #[error("default_limit must be > 0")]
    ZeroDefaultLimit,

    /// The signal weights break an invariant
    #[error(transparent)]
    Weights(#[from] WeightError),
}

/// Configuration surface of the ranking engine.
///
/// Unknown keys are rejected at deserialization time rather than silently
/// ignored at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Relative weight of each scoring signal
    #[serde(default)]
    pub weights: SignalWeights,

    /// Overall per-request latency budget, covering both collaborator calls
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Result size used when the request does not specify a limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_timeout_ms() -> u64 {
    250
}

// The original service always returned five recommendations
fn default_limit() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            timeout_ms: default_timeout_ms(),
            default_limit: default_limit(),
        }
    }
}

impl EngineConfig {
    /// Check all configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.default_limit == 0 {
            return Err(ConfigError::ZeroDefaultLimit);
        }
        self.weights.validate()?;
        Ok(())
    }

    /// The latency budget as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
