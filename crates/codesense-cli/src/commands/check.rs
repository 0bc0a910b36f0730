// One-shot analysis of a project

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use codesense_deps::DependencySensor;
use codesense_sensors::{SensorConfig, SensorRuntime};
use tracing::info;

use super::{Command, Outcome};
use crate::output::{OutputFormat, OutputStyle};
use crate::project::ProjectFiles;

/// `codesense check`
#[derive(Debug, Clone)]
pub struct CheckCommand {
    root: PathBuf,
    format: OutputFormat,
    config: Option<PathBuf>,
    style: OutputStyle,
}

impl CheckCommand {
    pub fn new(root: PathBuf, format: OutputFormat, config: Option<PathBuf>) -> Self {
        Self {
            root,
            format,
            config,
            style: OutputStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    /// Run the analysis and return the rendered report with its outcome
    pub async fn report(&self) -> anyhow::Result<(String, Outcome)> {
        let config = SensorConfig::load(self.config.as_deref())
            .context("failed to load sensor configuration")?;

        let sensor = DependencySensor::new();
        let mut project = ProjectFiles::new(&self.root)?;
        project.load_manifest(&sensor).await;
        let summary = project.sync(&sensor).await?;
        info!("Analysing {} files in {}", summary.added, self.root.display());

        let runtime = SensorRuntime::new(sensor, config)?;
        let result = runtime
            .monitor()
            .await
            .context("dependency analysis failed")?;

        let rendered = self.style.render(&result, self.format)?;
        Ok((rendered, Outcome::from_status(result.status)))
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self) -> anyhow::Result<Outcome> {
        let (rendered, outcome) = self.report().await?;
        println!("{}", rendered);
        Ok(outcome)
    }
}
