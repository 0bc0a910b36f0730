//! Error types for dependency analysis

use std::path::PathBuf;

use codesense_sensors::SensorError;
use thiserror::Error;

/// Errors that can occur while analysing source dependencies
#[derive(Debug, Error)]
pub enum DependencyError {
    /// An analyzer could not extract edges from a file
    #[error("Edge extraction failed for {path}: {reason}")]
    ExtractionFailed {
        /// File being analysed
        path: PathBuf,
        /// Why extraction failed
        reason: String,
    },

    /// The file is not part of the dependency graph
    #[error("File is not tracked: {0}")]
    FileNotTracked(PathBuf),

    /// The package manifest could not be read or parsed
    #[error("Failed to load manifest {path}: {reason}")]
    ManifestFailed {
        /// Path of the manifest
        path: PathBuf,
        /// Why loading failed
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DependencyError> for SensorError {
    fn from(err: DependencyError) -> Self {
        SensorError::detection(crate::sensor::SENSOR_NAME, err.to_string())
    }
}

/// Result type for dependency analysis
pub type Result<T> = std::result::Result<T, DependencyError>;
