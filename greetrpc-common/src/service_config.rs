use serde::{Deserialize, Serialize};

use crate::{GreetError, Result};

/// Retry policy executed by the client for transient failures.
///
/// Field defaults match the stock retrying service config: 5 attempts,
/// 500ms initial backoff doubling up to a 30s cap, retrying only calls the
/// server declined as unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub retry_on_unavailable: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            retry_on_unavailable: true,
        }
    }
}

impl RetryPolicy {
    /// Whether `err` is worth another attempt under this policy.
    /// Network-level failures are always transient; server 503s only when
    /// `retry_on_unavailable` is set. Everything else fails the call.
    pub fn retryable(&self, err: &GreetError) -> bool {
        match err {
            GreetError::Unavailable(_) => self.retry_on_unavailable,
            GreetError::Network(_) => true,
            _ => false,
        }
    }

    /// Backoff to apply after `backoff`, honoring the multiplier and cap.
    pub fn next_backoff_ms(&self, backoff_ms: u64) -> u64 {
        let next = (backoff_ms as f64 * self.backoff_multiplier) as u64;
        next.min(self.max_backoff_ms)
    }
}

/// Hedging policy executed by the client: up to `max_attempts` copies of the
/// call are staged `hedging_delay_ms` apart and the first success wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HedgingPolicy {
    pub max_attempts: u32,
    pub hedging_delay_ms: u64,
}

impl Default for HedgingPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, hedging_delay_ms: 1_000 }
    }
}

/// Per-client policy document, loadable from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub retry: RetryPolicy,
    pub hedging: HedgingPolicy,
}

impl ServiceConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GreetError::InvalidConfig(e.to_string()))
    }
}
