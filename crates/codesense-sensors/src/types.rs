//! Core types for the sensor framework

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::issue::{classify_status, ComputationalIssue};

/// Lifecycle state of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorStatus {
    Inactive,
    Active,
}

/// Aggregate status of a single monitoring cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor configuration snapshot
///
/// Never mutated in place: [`SensorConfig::merge`] produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorConfig {
    /// Period of the monitoring trigger
    pub monitoring_interval_ms: u64,
    /// How readily failures mark the sensor unhealthy, in `[0, 1]`
    pub sensitivity: f64,
    /// Recovery attempts made by `handle_failure`
    pub max_retries: u32,
    /// Capacity of the result ring buffer
    pub buffer_size: usize,
    /// Base delay of the recovery backoff
    pub retry_base_delay_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            monitoring_interval_ms: 5_000,
            sensitivity: 0.7,
            max_retries: 3,
            buffer_size: 100,
            retry_base_delay_ms: 1_000,
        }
    }
}

impl SensorConfig {
    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring_interval_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.monitoring_interval_ms == 0 {
            return Err(SensorError::InvalidConfig(
                "monitoringIntervalMs must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(SensorError::InvalidConfig(format!(
                "sensitivity must be within [0, 1], got {}",
                self.sensitivity
            )));
        }
        if self.buffer_size == 0 {
            return Err(SensorError::InvalidConfig(
                "bufferSize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Produce a new snapshot with `update` applied on top of this one
    pub fn merge(&self, update: &SensorConfigUpdate) -> Result<SensorConfig> {
        let merged = SensorConfig {
            monitoring_interval_ms: update
                .monitoring_interval_ms
                .unwrap_or(self.monitoring_interval_ms),
            sensitivity: update.sensitivity.unwrap_or(self.sensitivity),
            max_retries: update.max_retries.unwrap_or(self.max_retries),
            buffer_size: update.buffer_size.unwrap_or(self.buffer_size),
            retry_base_delay_ms: update
                .retry_base_delay_ms
                .unwrap_or(self.retry_base_delay_ms),
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// Partial configuration accepted by `update_config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfigUpdate {
    pub monitoring_interval_ms: Option<u64>,
    pub sensitivity: Option<f64>,
    pub max_retries: Option<u32>,
    pub buffer_size: Option<usize>,
    pub retry_base_delay_ms: Option<u64>,
}

/// Output of one monitoring cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorResult {
    pub timestamp: DateTime<Utc>,
    pub status: HealthStatus,
    pub issues: Vec<ComputationalIssue>,
    pub metrics: BTreeMap<String, f64>,
}

impl SensorResult {
    /// Build a result whose status is classified from `issues`
    pub fn from_issues(issues: Vec<ComputationalIssue>, metrics: BTreeMap<String, f64>) -> Self {
        Self {
            timestamp: Utc::now(),
            status: classify_status(&issues),
            issues,
            metrics,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Last recorded cycle failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub timestamp: DateTime<Utc>,
    pub error: String,
}

/// Aggregated counters for a sensor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorMetrics {
    pub total_monitoring_cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    /// Rolling mean over successful cycles, in milliseconds
    pub average_response_time: f64,
    pub last_successful_monitoring: Option<DateTime<Utc>>,
    pub last_failure: Option<FailureRecord>,
}

impl SensorMetrics {
    pub(crate) fn record_success(&mut self, elapsed: Duration, at: DateTime<Utc>) {
        self.total_monitoring_cycles += 1;
        self.successful_cycles += 1;
        let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
        let n = self.successful_cycles as f64;
        self.average_response_time += (elapsed_ms - self.average_response_time) / n;
        self.last_successful_monitoring = Some(at);
    }

    pub(crate) fn record_failure(&mut self, error: &SensorError) {
        self.total_monitoring_cycles += 1;
        self.failed_cycles += 1;
        self.last_failure = Some(FailureRecord {
            timestamp: Utc::now(),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SensorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_merge_produces_new_snapshot() {
        let original = SensorConfig::default();
        let merged = original
            .merge(&SensorConfigUpdate {
                buffer_size: Some(5),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(merged.buffer_size, 5);
        assert_eq!(merged.monitoring_interval_ms, original.monitoring_interval_ms);
        assert_eq!(original.buffer_size, 100);
    }

    #[test]
    fn test_merge_rejects_invalid_values() {
        let config = SensorConfig::default();
        let bad_sensitivity = SensorConfigUpdate {
            sensitivity: Some(1.5),
            ..Default::default()
        };
        let zero_interval = SensorConfigUpdate {
            monitoring_interval_ms: Some(0),
            ..Default::default()
        };
        let zero_buffer = SensorConfigUpdate {
            buffer_size: Some(0),
            ..Default::default()
        };

        assert!(matches!(config.merge(&bad_sensitivity), Err(SensorError::InvalidConfig(_))));
        assert!(matches!(config.merge(&zero_interval), Err(SensorError::InvalidConfig(_))));
        assert!(matches!(config.merge(&zero_buffer), Err(SensorError::InvalidConfig(_))));
    }

    #[test]
    fn test_rolling_average() {
        let mut metrics = SensorMetrics::default();
        metrics.record_success(Duration::from_millis(10), Utc::now());
        metrics.record_success(Duration::from_millis(30), Utc::now());

        assert_eq!(metrics.successful_cycles, 2);
        assert!((metrics.average_response_time - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_config_deserializes_camel_case_with_defaults() {
        let config: SensorConfig =
            serde_json::from_str(r#"{"monitoringIntervalMs": 250, "bufferSize": 7}"#).unwrap();
        assert_eq!(config.monitoring_interval_ms, 250);
        assert_eq!(config.buffer_size, 7);
        assert_eq!(config.max_retries, 3);
    }
}
