//! Dependency sensor driven through the sensor runtime

use std::path::Path;
use std::time::Duration;

use codesense_deps::{
    is_cycle_issue, metric, DependencySensor, PackageInfo, ResolutionEngine,
    CIRCULAR_DEPENDENCY_TAG,
};
use codesense_sensors::{HealthStatus, IssueType, SensorConfig, SensorRuntime, SensorStatus, Severity};
use tempfile::TempDir;

fn config() -> SensorConfig {
    SensorConfig {
        monitoring_interval_ms: 20,
        retry_base_delay_ms: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_empty_graph_is_healthy() {
    let runtime = SensorRuntime::new(DependencySensor::new(), config()).unwrap();

    let result = runtime.monitor().await.unwrap();
    assert_eq!(result.status, HealthStatus::Healthy);
    assert!(result.issues.is_empty());
    for key in [
        metric::FILES,
        metric::EDGES,
        metric::EXTERNAL_EDGES,
        metric::MISSING_DEPENDENCIES,
        metric::CIRCULAR_DEPENDENCIES,
        metric::ISSUES,
    ] {
        assert_eq!(result.metric(key), Some(0.0), "metric {key}");
    }

    let stats = runtime.sensor().get_dependency_stats().await;
    assert_eq!(stats.tracked_files, 0);
    assert_eq!(stats.total_edges, 0);
}

#[tokio::test]
async fn test_declared_and_undeclared_packages() {
    let runtime = SensorRuntime::new(DependencySensor::new(), config()).unwrap();
    let sensor = runtime.sensor();
    sensor
        .set_package_info(PackageInfo::new("web", "1.0.0").with_dependency("react", "^18"))
        .await;
    sensor
        .add_file(
            "src/main.tsx",
            "import React from 'react';\nimport widget from 'unknown-pkg';\n",
        )
        .await;

    let result = runtime.monitor().await.unwrap();
    let missing: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.issue_type == IssueType::DependencyMissing)
        .collect();

    assert_eq!(missing.len(), 1);
    assert!(missing[0].has_tag("unknown-pkg"));
    assert_eq!(missing[0].severity, Severity::High);
    assert_eq!(result.status, HealthStatus::Critical);
    assert_eq!(runtime.get_metrics().successful_cycles, 1);
}

#[tokio::test]
async fn test_two_file_cycle_and_bystander() {
    let sensor = DependencySensor::new();
    sensor.add_file("src/a.ts", "import { b } from './b';").await;
    sensor.add_file("src/b.ts", "import { a } from './a';").await;

    let issues = sensor.get_dependency_issues().await;
    let cycles: Vec<_> = issues.iter().filter(|i| is_cycle_issue(i)).collect();
    assert!(!cycles.is_empty());
    let related = &cycles[0].context.related_files;
    assert!(related.contains(&"src/a.ts".to_string()));
    assert!(related.contains(&"src/b.ts".to_string()));
    assert_eq!(cycles[0].issue_type, IssueType::ArchitecturalInconsistency);

    // c imports a but nothing imports c
    sensor.add_file("src/c.ts", "import { a } from './a';").await;
    let with_c = sensor.get_dependency_issues().await;
    assert_eq!(
        with_c.iter().filter(|i| i.has_tag(CIRCULAR_DEPENDENCY_TAG)).count(),
        cycles.len()
    );
}

#[tokio::test]
async fn test_three_file_cycle_is_critical() {
    let sensor = DependencySensor::new();
    sensor.add_file("lib/x.js", "const y = require('./y');").await;
    sensor.add_file("lib/y.js", "export * from './z';").await;
    sensor.add_file("lib/z/index.js", "import('../x');").await;
    // "./z" resolves to lib/z/index.js, "../x" from lib/z/index.js to lib/x.js

    let issues = sensor.get_dependency_issues().await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Critical);
    assert_eq!(issues[0].context.related_files.len(), 3);
}

#[tokio::test]
async fn test_import_above_project_root_is_not_a_cycle() {
    let sensor = DependencySensor::new();
    sensor.add_file("a.ts", "import b from '../../b';").await;
    sensor.add_file("b.ts", "import a from './a';").await;

    let issues = sensor.get_dependency_issues().await;
    assert!(!issues.iter().any(is_cycle_issue), "{:?}", issues);
}

#[tokio::test]
async fn test_every_cyclic_file_is_reported() {
    let sensor = DependencySensor::new();
    sensor
        .add_file("src/a.ts", "import b from './b';\nimport c from './c';")
        .await;
    sensor.add_file("src/b.ts", "import a from './a';").await;
    sensor.add_file("src/c.ts", "import b from './b';").await;

    let reported: std::collections::BTreeSet<String> = sensor
        .get_dependency_issues()
        .await
        .iter()
        .filter(|i| is_cycle_issue(i))
        .flat_map(|i| i.context.related_files.clone())
        .collect();
    assert_eq!(
        reported.into_iter().collect::<Vec<_>>(),
        vec!["src/a.ts", "src/b.ts", "src/c.ts"]
    );
}

#[test]
fn test_builtin_and_deprecated_resolution() {
    let engine = ResolutionEngine::new();
    let from = Path::new("src/index.ts");

    let fs = engine.resolve("fs", from, None);
    assert!(fs.resolved);
    assert_eq!(fs.resolved_path.as_deref(), Some("builtin:fs"));

    let moment = engine.resolve("moment", from, None);
    assert!(!moment.resolved);
    let suggestions = moment.suggestions.unwrap_or_default();
    assert!(suggestions.contains(&"date-fns".to_string()));
    assert!(suggestions.contains(&"dayjs".to_string()));
}

#[tokio::test]
async fn test_manifest_loaded_from_project_root() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "api", "version": "2.0.0", "dependencies": { "express": "^4.19.0" } }"#,
    )
    .unwrap();

    let sensor = DependencySensor::new();
    sensor.load_package_info(dir.path()).await.unwrap();
    sensor
        .add_file("server.cjs", "const express = require('express');")
        .await;

    assert!(sensor.get_dependency_issues().await.is_empty());
    assert_eq!(sensor.package_info().await.unwrap().name, "api");

    let missing = TempDir::new().unwrap();
    assert!(sensor.load_package_info(missing.path()).await.is_err());
    // the previous snapshot survives a failed load
    assert!(sensor.package_info().await.is_some());
}

#[tokio::test]
async fn test_periodic_monitoring_picks_up_file_changes() {
    let runtime = SensorRuntime::new(DependencySensor::new(), config()).unwrap();
    runtime.start_monitoring().await;
    assert_eq!(runtime.get_status(), SensorStatus::Active);

    runtime
        .sensor()
        .add_file("src/a.ts", "import left from 'left-pad';")
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    runtime.stop_monitoring().await;

    let recent = runtime.get_recent_results(1);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].metric(metric::MISSING_DEPENDENCIES), Some(1.0));
    assert_eq!(runtime.get_status(), SensorStatus::Inactive);
    assert!(runtime.is_healthy());
}
