//! Loading sensor configuration from files and the environment

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::types::{SensorConfig, SensorConfigUpdate};

/// Prefix of environment overrides, e.g. `CODESENSE_BUFFER_SIZE=50`
pub const ENV_PREFIX: &str = "CODESENSE";

/// Raw settings as read from sources; keys are snake_case because the
/// environment source lowercases everything.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SensorSettings {
    monitoring_interval_ms: Option<u64>,
    sensitivity: Option<f64>,
    max_retries: Option<u32>,
    buffer_size: Option<usize>,
    retry_base_delay_ms: Option<u64>,
}

impl From<SensorSettings> for SensorConfigUpdate {
    fn from(settings: SensorSettings) -> Self {
        SensorConfigUpdate {
            monitoring_interval_ms: settings.monitoring_interval_ms,
            sensitivity: settings.sensitivity,
            max_retries: settings.max_retries,
            buffer_size: settings.buffer_size,
            retry_base_delay_ms: settings.retry_base_delay_ms,
        }
    }
}

impl SensorConfig {
    /// Defaults, then `path` (TOML, JSON or YAML by extension), then `CODESENSE_*`
    /// environment variables. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<SensorConfig> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`SensorConfig::load`] with a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<SensorConfig> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading sensor configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let settings: SensorSettings = builder.build()?.try_deserialize()?;
        SensorConfig::default().merge(&settings.into())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::SensorError;

    #[test]
    fn test_load_defaults_without_sources() {
        let config = SensorConfig::load_with_prefix(None, "CODESENSE_TEST_EMPTY").unwrap();
        assert_eq!(config, SensorConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensors.toml");
        fs::write(
            &path,
            "monitoring_interval_ms = 250\nbuffer_size = 12\nsensitivity = 0.5\n",
        )
        .unwrap();

        let config = SensorConfig::load_with_prefix(Some(&path), "CODESENSE_TEST_FILE").unwrap();
        assert_eq!(config.monitoring_interval_ms, 250);
        assert_eq!(config.buffer_size, 12);
        assert_eq!(config.sensitivity, 0.5);
        assert_eq!(config.max_retries, SensorConfig::default().max_retries);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensors.toml");
        fs::write(&path, "buffer_size = 0\n").unwrap();

        let result = SensorConfig::load_with_prefix(Some(&path), "CODESENSE_TEST_INVALID");
        assert!(matches!(result, Err(SensorError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let result = SensorConfig::load_with_prefix(Some(&path), "CODESENSE_TEST_MISSING");
        assert!(matches!(result, Err(SensorError::ConfigLoad(_))));
    }
}
