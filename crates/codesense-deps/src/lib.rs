#![forbid(unsafe_code)]

//! Source-level dependency analysis for JavaScript and TypeScript projects
//!
//! Files are tracked in a [`DependencyGraph`]. Their import edges come from
//! pluggable [`LanguageAnalyzer`]s, and each edge is resolved against runtime
//! builtins, relative paths and the declared packages of the project's
//! `package.json`. [`DependencySensor`] wraps all of this in the
//! [`codesense_sensors::Sensor`] contract, so unresolved packages and import
//! cycles surface as [`codesense_sensors::ComputationalIssue`]s.

pub mod analyzer;
pub mod cycles;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod models;
pub mod resolution;
pub mod sensor;

pub use analyzer::{AnalyzerRegistry, JavaScriptAnalyzer, LanguageAnalyzer};
pub use cycles::{CycleDetector, CIRCULAR_DEPENDENCY_TAG};
pub use error::{DependencyError, Result};
pub use graph::DependencyGraph;
pub use manifest::{load_package_info, MANIFEST_FILE};
pub use models::{
    DependencyEdge, DependencyStats, EdgeType, FileNode, PackageInfo, ResolutionResult,
};
pub use resolution::ResolutionEngine;
pub use sensor::{is_cycle_issue, metric, DependencySensor, MISSING_DEPENDENCY_TAG, SENSOR_NAME};
