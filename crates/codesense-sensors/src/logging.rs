//! Tracing subscriber setup

use std::str::FromStr;

use tracing::Level;

use crate::error::{Result, SensorError};

/// Install a fmt subscriber at `level` (`trace`, `debug`, `info`, `warn`, `error`).
///
/// Only the first successful call installs a subscriber; later calls are ignored.
pub fn init_logging(level: &str) -> Result<()> {
    let level = Level::from_str(level)
        .map_err(|_| SensorError::Logging(format!("unknown log level '{}'", level)))?;

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
