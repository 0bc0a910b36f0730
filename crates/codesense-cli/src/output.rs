// Result rendering for the terminal

use std::io::IsTerminal;

use clap::ValueEnum;
use codesense_sensors::{ComputationalIssue, HealthStatus, SensorResult, Severity};
use colored::Colorize;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with one line per issue
    Text,
    /// The sensor result as pretty-printed JSON
    Json,
}

/// Output styling configuration
#[derive(Debug, Clone, Copy)]
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: std::io::stdout().is_terminal(),
        }
    }
}

impl OutputStyle {
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    /// Render a result in `format`
    pub fn render(&self, result: &SensorResult, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Text => Ok(self.render_text(result)),
        }
    }

    fn render_text(&self, result: &SensorResult) -> String {
        let mut out = format!(
            "{} {}  {} issue(s)",
            result.timestamp.format("%H:%M:%S"),
            self.status(result.status),
            result.issues.len()
        );

        if !result.metrics.is_empty() {
            let metrics: Vec<String> = result
                .metrics
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            out.push_str(&format!("\n  {}", metrics.join(" ")));
        }

        for issue in &result.issues {
            out.push('\n');
            out.push_str(&self.issue(issue));
        }
        out
    }

    fn status(&self, status: HealthStatus) -> String {
        if !self.use_colors {
            return status.to_string();
        }
        match status {
            HealthStatus::Healthy => status.as_str().green().bold().to_string(),
            HealthStatus::Warning => status.as_str().yellow().bold().to_string(),
            HealthStatus::Critical => status.as_str().red().bold().to_string(),
        }
    }

    fn severity(&self, severity: Severity) -> String {
        let label = format!("{:<8}", severity.as_str());
        if !self.use_colors {
            return label;
        }
        match severity {
            Severity::Low | Severity::Medium => label.yellow().to_string(),
            Severity::High => label.red().to_string(),
            Severity::Critical | Severity::Blocking => label.red().bold().to_string(),
        }
    }

    fn issue(&self, issue: &ComputationalIssue) -> String {
        let location = match (issue.context.line, issue.context.column) {
            (Some(line), Some(column)) => format!("{}:{}:{}", issue.context.file, line, column),
            (Some(line), None) => format!("{}:{}", issue.context.file, line),
            _ => issue.context.file.clone(),
        };

        let mut line = format!(
            "  {} {}  {}",
            self.severity(issue.severity),
            location,
            issue.description
        );
        if let Some(fix) = &issue.suggested_fix {
            let hint = format!("fix: {}", fix);
            let hint = if self.use_colors {
                hint.dimmed().to_string()
            } else {
                hint
            };
            line.push_str(&format!("\n      {}", hint));
        }
        line
    }
}
