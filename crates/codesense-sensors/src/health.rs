//! Health derivation from recent cycle outcomes

use std::collections::VecDeque;

/// Number of most recent cycle outcomes considered for health
pub const HEALTH_WINDOW: usize = 10;

/// Consecutive successes needed to clear a forced-unhealthy mark
pub const RECOVERY_RUN: u32 = 3;

/// Tracks recent outcomes and answers whether the sensor is healthy
#[derive(Debug, Clone, Default)]
pub struct HealthTracker {
    outcomes: VecDeque<bool>,
    consecutive_successes: u32,
    forced_unhealthy: bool,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.push(true);
        self.consecutive_successes += 1;
        if self.forced_unhealthy && self.consecutive_successes >= RECOVERY_RUN {
            self.forced_unhealthy = false;
        }
    }

    pub fn record_failure(&mut self) {
        self.push(false);
        self.consecutive_successes = 0;
    }

    /// Mark unhealthy until a run of successes is observed
    pub fn mark_unhealthy(&mut self) {
        self.forced_unhealthy = true;
        self.consecutive_successes = 0;
    }

    /// Forget past failures after a successful recovery
    pub fn reset(&mut self) {
        self.outcomes.clear();
        self.consecutive_successes = 0;
        self.forced_unhealthy = false;
    }

    /// Fraction of failed cycles within the window
    pub fn failure_ratio(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.outcomes.iter().filter(|ok| !**ok).count();
        failures as f64 / self.outcomes.len() as f64
    }

    /// Healthy while the failure ratio stays within `1 - sensitivity`
    pub fn is_healthy(&self, sensitivity: f64) -> bool {
        if self.forced_unhealthy {
            return false;
        }
        let threshold = 1.0 - sensitivity.clamp(0.0, 1.0);
        self.failure_ratio() <= threshold
    }

    fn push(&mut self, ok: bool) {
        if self.outcomes.len() == HEALTH_WINDOW {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(ok);
    }
}
