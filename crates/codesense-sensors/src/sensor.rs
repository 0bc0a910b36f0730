//! The contract a concrete sensor implements

use async_trait::async_trait;

use crate::error::{Result, SensorError};
use crate::types::SensorResult;

/// Domain-specific detection routine driven by a [`crate::SensorRuntime`]
#[async_trait]
pub trait Sensor: Send + Sync + 'static {
    /// Identity reported in issue metadata and logs
    fn name(&self) -> &str;

    /// Run one detection pass
    async fn perform_monitoring(&self) -> Result<SensorResult>;

    /// Attempt to recover after a failed cycle.
    ///
    /// The default runs one detection pass and discards its output.
    async fn recover(&self, _error: &SensorError) -> Result<()> {
        self.perform_monitoring().await.map(|_| ())
    }
}
