#![forbid(unsafe_code)]

//! Sensor framework for codesense
//!
//! A sensor wraps a domain-specific detection routine in a uniform lifecycle:
//! start/stop, periodic monitoring cycles, metrics, a bounded result history,
//! derived health, and bounded exponential-backoff recovery after failures.

pub mod buffer;
pub mod error;
pub mod health;
pub mod issue;
pub mod logging;
pub mod recovery;
pub mod runtime;
pub mod sensor;
pub mod settings;
pub mod types;

pub use buffer::ResultBuffer;
pub use error::{Result, SensorError};
pub use health::HealthTracker;
pub use issue::{
    classify_status, ComputationalIssue, IssueContext, IssueId, IssueMetadata, IssueType,
    Severity,
};
pub use logging::init_logging;
pub use recovery::BackoffPolicy;
pub use runtime::SensorRuntime;
pub use sensor::Sensor;
pub use types::{
    FailureRecord, HealthStatus, SensorConfig, SensorConfigUpdate, SensorMetrics, SensorResult,
    SensorStatus,
};
