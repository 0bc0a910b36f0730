//! Exponential backoff for failure recovery

use std::time::Duration;

use crate::types::SensorConfig;

/// Backoff schedule used by `handle_failure`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Maximum recovery attempts
    pub max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Self {
        Self::new(config.retry_base_delay(), config.max_retries)
    }

    /// Delay after failed attempt `attempt` (0-based): `base * 2^attempt`, saturating
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether another attempt follows `attempt` (0-based)
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_retries
    }
}
