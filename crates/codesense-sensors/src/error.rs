//! Error types for the sensor framework

use thiserror::Error;

/// Errors raised by sensors and their lifecycle
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Detection failed in {sensor}: {reason}")]
    DetectionFailed { sensor: String, reason: String },

    #[error("Recovery exhausted after {attempts} attempts: {last_error}")]
    RecoveryExhausted { attempts: u32, last_error: String },

    #[error("Invalid sensor configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load sensor configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

impl SensorError {
    /// Convenience constructor for a failed detection step
    pub fn detection(sensor: impl Into<String>, reason: impl Into<String>) -> Self {
        SensorError::DetectionFailed {
            sensor: sensor.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for sensor operations
pub type Result<T> = std::result::Result<T, SensorError>;
