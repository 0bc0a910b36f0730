// Continuous monitoring of a project

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codesense_deps::DependencySensor;
use codesense_sensors::{SensorConfig, SensorConfigUpdate, SensorRuntime};
use tracing::{info, warn};

use super::{Command, Outcome};
use crate::output::{OutputFormat, OutputStyle};
use crate::project::ProjectFiles;

/// `codesense watch`
#[derive(Debug, Clone)]
pub struct WatchCommand {
    root: PathBuf,
    interval_ms: Option<u64>,
    config: Option<PathBuf>,
    format: OutputFormat,
    style: OutputStyle,
}

impl WatchCommand {
    pub fn new(
        root: PathBuf,
        interval_ms: Option<u64>,
        config: Option<PathBuf>,
        format: OutputFormat,
    ) -> Self {
        Self {
            root,
            interval_ms,
            config,
            format,
            style: OutputStyle::default(),
        }
    }

    /// Configuration file and environment, then the `--interval` override
    pub fn resolve_config(&self) -> anyhow::Result<SensorConfig> {
        let config = SensorConfig::load(self.config.as_deref())
            .context("failed to load sensor configuration")?;
        let update = SensorConfigUpdate {
            monitoring_interval_ms: self.interval_ms,
            ..Default::default()
        };
        Ok(config.merge(&update)?)
    }
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self) -> anyhow::Result<Outcome> {
        let config = self.resolve_config()?;
        let poll = config.monitoring_interval();
        let history = config.buffer_size;

        let sensor = DependencySensor::new();
        let mut project = ProjectFiles::new(&self.root)?;
        project.load_manifest(&sensor).await;
        project.sync(&sensor).await?;

        let runtime = SensorRuntime::new(sensor, config)?;
        runtime.start_monitoring().await;
        info!(
            "Watching {} every {:?}; press Ctrl-C to stop",
            self.root.display(),
            poll
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(poll);
        let mut last_printed: Option<DateTime<Utc>> = None;
        let mut outcome = Outcome::Clean;

        loop {
            tokio::select! {
                signal = &mut shutdown => {
                    if let Err(e) = signal {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = project.sync(runtime.sensor()).await {
                        warn!("Project sync failed: {:#}", e);
                    }

                    for result in runtime.get_recent_results(history) {
                        if last_printed.is_some_and(|seen| result.timestamp <= seen) {
                            continue;
                        }
                        println!("{}", self.style.render(&result, self.format)?);
                        last_printed = Some(result.timestamp);
                        outcome = Outcome::from_status(result.status);
                    }

                    if !runtime.is_healthy() {
                        warn!("Sensor {} is unhealthy", runtime.name());
                    }
                }
            }
        }

        runtime.stop_monitoring().await;
        info!("Stopped watching {}", self.root.display());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_flag_overrides_config() {
        let command = WatchCommand::new(PathBuf::from("."), Some(250), None, OutputFormat::Text);
        let config = command.resolve_config().unwrap();
        assert_eq!(config.monitoring_interval_ms, 250);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let command = WatchCommand::new(PathBuf::from("."), Some(0), None, OutputFormat::Text);
        assert!(command.resolve_config().is_err());
    }
}
