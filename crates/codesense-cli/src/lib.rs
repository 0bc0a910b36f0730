//! Command-line runner for codesense
//!
//! `codesense check` runs one dependency analysis over a project and exits
//! non-zero when the result is critical. `codesense watch` keeps a sensor armed
//! and prints every new result until interrupted.

pub mod cli;
pub mod commands;
pub mod output;
pub mod project;

pub use cli::{Cli, Commands};
pub use commands::{CheckCommand, Command, Outcome, WatchCommand};
pub use output::{OutputFormat, OutputStyle};
pub use project::{ProjectFiles, SyncSummary};
