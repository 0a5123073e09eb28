//! Storage retry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for transient storage failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_backoff")]
    pub backoff: f64,
}

impl RetryConfig {
    /// Initial delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
            backoff: default_backoff(),
        }
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    100
}

fn default_backoff() -> f64 {
    2.0
}
