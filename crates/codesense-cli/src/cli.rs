// Argument parsing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{CheckCommand, Command, Outcome, WatchCommand};
use crate::output::OutputFormat;

/// codesense - dependency sensors for JavaScript and TypeScript projects
#[derive(Parser, Debug)]
#[command(name = "codesense")]
#[command(bin_name = "codesense")]
#[command(about = "Detect missing packages and import cycles in JS/TS projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one analysis and exit non-zero on critical findings
    Check {
        /// Project root (default: current directory)
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Sensor configuration file (TOML, YAML or JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Monitor the project periodically until Ctrl-C
    Watch {
        /// Project root (default: current directory)
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// Monitoring interval in milliseconds, overriding the configuration
        #[arg(long, value_name = "MS")]
        interval: Option<u64>,

        /// Sensor configuration file (TOML, YAML or JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Cli {
    /// Execute the selected subcommand
    pub async fn run(&self) -> anyhow::Result<Outcome> {
        match &self.command {
            Commands::Check {
                root,
                format,
                config,
            } => {
                CheckCommand::new(root.clone(), *format, config.clone())
                    .execute()
                    .await
            }
            Commands::Watch {
                root,
                interval,
                config,
                format,
            } => {
                WatchCommand::new(root.clone(), *interval, config.clone(), *format)
                    .execute()
                    .await
            }
        }
    }
}
