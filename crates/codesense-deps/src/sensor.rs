//! Sensor reporting missing packages and import cycles

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use codesense_sensors::{
    ComputationalIssue, IssueContext, IssueType, Sensor, SensorResult, Severity,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::analyzer::{AnalyzerRegistry, LanguageAnalyzer};
use crate::cycles::{CycleDetector, CIRCULAR_DEPENDENCY_TAG};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::manifest;
use crate::models::{DependencyEdge, DependencyStats, PackageInfo, ResolutionResult};
use crate::resolution::package_name;

/// Name reported in issue metadata
pub const SENSOR_NAME: &str = "dependency-sensor";

/// Tag attached to every missing-package issue, next to the specifier itself
pub const MISSING_DEPENDENCY_TAG: &str = "missing-dependency";

const CONFIDENCE_WITH_MANIFEST: f64 = 0.9;
const CONFIDENCE_WITHOUT_MANIFEST: f64 = 0.6;

/// Metric keys of a dependency monitoring cycle
pub mod metric {
    pub const FILES: &str = "files";
    pub const EDGES: &str = "edges";
    pub const EXTERNAL_EDGES: &str = "external_edges";
    pub const MISSING_DEPENDENCIES: &str = "missing_dependencies";
    pub const CIRCULAR_DEPENDENCIES: &str = "circular_dependencies";
    pub const ISSUES: &str = "issues";
}

#[derive(Debug, Default)]
struct DependencyState {
    graph: DependencyGraph,
    package_info: Option<PackageInfo>,
}

/// Outcome of one full analysis pass
#[derive(Debug)]
struct Analysis {
    issues: Vec<ComputationalIssue>,
    stats: DependencyStats,
    missing: usize,
    cycles: usize,
}

/// Tracks source files and reports dependency problems
///
/// All mutations and analysis passes go through one async mutex, so a cycle
/// never observes a half-applied file update.
#[derive(Debug)]
pub struct DependencySensor {
    state: Mutex<DependencyState>,
    detector: CycleDetector,
}

impl Default for DependencySensor {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencySensor {
    pub fn new() -> Self {
        Self::with_registry(AnalyzerRegistry::with_defaults())
    }

    pub fn with_registry(registry: AnalyzerRegistry) -> Self {
        Self {
            state: Mutex::new(DependencyState {
                graph: DependencyGraph::with_registry(registry),
                package_info: None,
            }),
            detector: CycleDetector::new(SENSOR_NAME),
        }
    }

    /// Install the manifest snapshot used for package resolution
    pub async fn set_package_info(&self, info: PackageInfo) {
        debug!(
            "Package info set: {} ({} declared packages)",
            info.name,
            info.declared_packages().count()
        );
        self.state.lock().await.package_info = Some(info);
    }

    pub async fn clear_package_info(&self) {
        self.state.lock().await.package_info = None;
    }

    pub async fn package_info(&self) -> Option<PackageInfo> {
        self.state.lock().await.package_info.clone()
    }

    /// Read `<project_root>/package.json` and install it
    pub async fn load_package_info(&self, project_root: &Path) -> Result<()> {
        let info = manifest::load_package_info(project_root).await?;
        info!("Loaded package manifest for {:?}", project_root);
        self.set_package_info(info).await;
        Ok(())
    }

    /// Track a file; returns true when it replaced an existing node
    pub async fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) -> bool {
        let mut state = self.state.lock().await;
        state.graph.add_file(path, content).await
    }

    pub async fn update_file(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.graph.update_file(path, content).await
    }

    pub async fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().await.graph.remove_file(path)
    }

    /// Install an analyzer; returns how many tracked files were re-analysed
    pub async fn register_analyzer(&self, analyzer: Arc<dyn LanguageAnalyzer>) -> usize {
        let mut state = self.state.lock().await;
        state.graph.register_analyzer(analyzer).await
    }

    /// Extensions some registered analyzer claims, without leading dots
    pub async fn extensions(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .graph
            .registry()
            .extensions()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub async fn tracked_files(&self) -> Vec<PathBuf> {
        let state = self.state.lock().await;
        state.graph.nodes().map(|n| n.path.clone()).collect()
    }

    /// Edges of one tracked file
    pub async fn edges_of(&self, path: impl AsRef<Path>) -> Option<Vec<DependencyEdge>> {
        let state = self.state.lock().await;
        state.graph.node(path).map(|n| n.edges.clone())
    }

    /// Missing packages first (in file and position order), then cycles
    pub async fn get_dependency_issues(&self) -> Vec<ComputationalIssue> {
        let state = self.state.lock().await;
        self.analyze(&state).await.issues
    }

    pub async fn get_dependency_stats(&self) -> DependencyStats {
        let state = self.state.lock().await;
        state.graph.stats(state.package_info.as_ref()).await
    }

    async fn analyze(&self, state: &DependencyState) -> Analysis {
        let package_info = state.package_info.as_ref();
        let mut issues = Vec::new();
        let mut stats = DependencyStats {
            tracked_files: state.graph.len(),
            ..Default::default()
        };

        for edge in state.graph.edges() {
            stats.total_edges += 1;
            if edge.is_external {
                stats.external_edges += 1;
            }

            let resolution = state.graph.resolve_edge(edge, package_info).await;
            if resolution.resolved {
                continue;
            }
            stats.unresolved_edges += 1;
            if edge.is_external {
                issues.push(missing_dependency_issue(edge, resolution, package_info.is_some()));
            }
        }
        let missing = issues.len();

        let cycle_issues = self.detector.detect(&state.graph);
        let cycles = cycle_issues.len();
        issues.extend(cycle_issues);

        Analysis {
            issues,
            stats,
            missing,
            cycles,
        }
    }
}

fn missing_dependency_issue(
    edge: &DependencyEdge,
    resolution: ResolutionResult,
    has_manifest: bool,
) -> ComputationalIssue {
    let file = edge.source.to_string_lossy().into_owned();
    let package = package_name(&edge.target);
    let reason = resolution
        .error
        .unwrap_or_else(|| format!("cannot resolve module '{}'", edge.target));

    let fix = match resolution.suggestions {
        Some(alternatives) => format!("Consider using {} instead", alternatives.join(", ")),
        None => format!("Add '{}' to the dependencies in package.json", package),
    };

    let confidence = if has_manifest {
        CONFIDENCE_WITH_MANIFEST
    } else {
        CONFIDENCE_WITHOUT_MANIFEST
    };

    ComputationalIssue::new(
        IssueType::DependencyMissing,
        Severity::High,
        format!("{}: {}", file, reason),
        IssueContext::at(file, edge.line, edge.column).with_scope("import"),
        SENSOR_NAME,
    )
    .with_confidence(confidence)
    .with_tags([MISSING_DEPENDENCY_TAG, edge.target.as_str()])
    .with_suggested_fix(fix)
}

#[async_trait]
impl Sensor for DependencySensor {
    fn name(&self) -> &str {
        SENSOR_NAME
    }

    async fn perform_monitoring(&self) -> codesense_sensors::Result<SensorResult> {
        let state = self.state.lock().await;
        let analysis = self.analyze(&state).await;
        drop(state);

        debug!(
            "Dependency cycle: {} files, {} edges, {} missing, {} circular",
            analysis.stats.tracked_files,
            analysis.stats.total_edges,
            analysis.missing,
            analysis.cycles
        );

        let mut metrics = BTreeMap::new();
        metrics.insert(metric::FILES.to_string(), analysis.stats.tracked_files as f64);
        metrics.insert(metric::EDGES.to_string(), analysis.stats.total_edges as f64);
        metrics.insert(
            metric::EXTERNAL_EDGES.to_string(),
            analysis.stats.external_edges as f64,
        );
        metrics.insert(
            metric::MISSING_DEPENDENCIES.to_string(),
            analysis.missing as f64,
        );
        metrics.insert(
            metric::CIRCULAR_DEPENDENCIES.to_string(),
            analysis.cycles as f64,
        );
        metrics.insert(metric::ISSUES.to_string(), analysis.issues.len() as f64);

        Ok(SensorResult::from_issues(analysis.issues, metrics))
    }
}

/// Whether an issue was raised for an import cycle
pub fn is_cycle_issue(issue: &ComputationalIssue) -> bool {
    issue.has_tag(CIRCULAR_DEPENDENCY_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesense_sensors::HealthStatus;

    fn react_manifest() -> PackageInfo {
        PackageInfo::new("web", "1.0.0").with_dependency("react", "^18")
    }

    #[tokio::test]
    async fn test_unknown_package_reported_once() {
        let sensor = DependencySensor::new();
        sensor.set_package_info(react_manifest()).await;
        sensor
            .add_file(
                "src/app.tsx",
                "import React from 'react';\nimport thing from 'unknown-pkg';\n",
            )
            .await;

        let issues = sensor.get_dependency_issues().await;
        assert_eq!(issues.len(), 1);

        let issue = &issues[0];
        assert_eq!(issue.issue_type, IssueType::DependencyMissing);
        assert_eq!(issue.severity, Severity::High);
        assert!(issue.has_tag("unknown-pkg"));
        assert!(issue.has_tag(MISSING_DEPENDENCY_TAG));
        assert_eq!(issue.context.line, Some(2));
        assert_eq!(issue.context.column, Some(20));
        assert_eq!(issue.metadata.confidence, CONFIDENCE_WITH_MANIFEST);
        assert_eq!(issue.metadata.detected_by, SENSOR_NAME);
        assert_eq!(
            issue.suggested_fix.as_deref(),
            Some("Add 'unknown-pkg' to the dependencies in package.json")
        );
    }

    #[tokio::test]
    async fn test_missing_without_manifest_has_lower_confidence() {
        let sensor = DependencySensor::new();
        sensor.add_file("index.js", "const m = require('moment');").await;

        let issues = sensor.get_dependency_issues().await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].metadata.confidence, CONFIDENCE_WITHOUT_MANIFEST);
        assert_eq!(
            issues[0].suggested_fix.as_deref(),
            Some("Consider using date-fns, dayjs, luxon instead")
        );
    }

    #[tokio::test]
    async fn test_builtins_and_relative_imports_are_not_missing() {
        let sensor = DependencySensor::new();
        sensor
            .add_file(
                "src/a.ts",
                "import fs from 'node:fs';\nimport { join } from 'path';\nimport b from './b';\n",
            )
            .await;
        assert!(sensor.get_dependency_issues().await.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_issues_follow_missing_issues() {
        let sensor = DependencySensor::new();
        sensor.set_package_info(react_manifest()).await;
        sensor.add_file("src/a.ts", "import { b } from './b';").await;
        sensor
            .add_file("src/b.ts", "import { a } from './a';\nimport x from 'nope';")
            .await;

        let issues = sensor.get_dependency_issues().await;
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].issue_type, IssueType::DependencyMissing);
        assert!(is_cycle_issue(&issues[1]));
        assert_eq!(issues[1].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_update_and_remove_change_results() {
        let sensor = DependencySensor::new();
        sensor.add_file("src/a.ts", "import { b } from './b';").await;
        sensor.add_file("src/b.ts", "import { a } from './a';").await;
        assert_eq!(sensor.get_dependency_issues().await.len(), 1);

        sensor.update_file("src/b.ts", "export const b = 1;").await.unwrap();
        assert!(sensor.get_dependency_issues().await.is_empty());

        sensor.update_file("src/b.ts", "import { a } from './a';").await.unwrap();
        assert!(sensor.remove_file("src/a.ts").await);
        assert!(sensor.get_dependency_issues().await.is_empty());
        assert_eq!(sensor.tracked_files().await, vec![PathBuf::from("src/b.ts")]);
    }

    #[tokio::test]
    async fn test_perform_monitoring_metrics() {
        let sensor = DependencySensor::new();
        sensor.set_package_info(react_manifest()).await;
        sensor
            .add_file("src/a.ts", "import React from 'react';\nimport b from './b';\nimport l from 'lodash';")
            .await;
        sensor.add_file("src/b.ts", "import a from './a';").await;

        let result = sensor.perform_monitoring().await.unwrap();
        assert_eq!(result.status, HealthStatus::Critical);
        assert_eq!(result.metric(metric::FILES), Some(2.0));
        assert_eq!(result.metric(metric::EDGES), Some(4.0));
        assert_eq!(result.metric(metric::EXTERNAL_EDGES), Some(2.0));
        assert_eq!(result.metric(metric::MISSING_DEPENDENCIES), Some(1.0));
        assert_eq!(result.metric(metric::CIRCULAR_DEPENDENCIES), Some(1.0));
        assert_eq!(result.metric(metric::ISSUES), Some(2.0));
    }

    #[tokio::test]
    async fn test_stats_count_unresolved_edges() {
        let sensor = DependencySensor::new();
        sensor
            .add_file("a.mjs", "import x from 'express';\nimport y from './y.mjs';")
            .await;

        let stats = sensor.get_dependency_stats().await;
        assert_eq!(stats.tracked_files, 1);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.external_edges, 1);
        assert_eq!(stats.unresolved_edges, 1);

        sensor
            .set_package_info(PackageInfo::new("svc", "0.1.0").with_dependency("express", "^4"))
            .await;
        assert_eq!(sensor.get_dependency_stats().await.unresolved_edges, 0);
    }
}
