// Command handlers for the codesense CLI

pub mod check;
pub mod watch;

pub use check::CheckCommand;
pub use watch::WatchCommand;

use std::process::ExitCode;

use codesense_sensors::HealthStatus;

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing critical was found
    Clean,
    /// The last result was critical
    Critical,
}

impl Outcome {
    pub fn from_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Critical => Outcome::Critical,
            HealthStatus::Healthy | HealthStatus::Warning => Outcome::Clean,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::Critical => ExitCode::from(1),
        }
    }
}

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> anyhow::Result<Outcome>;
}
