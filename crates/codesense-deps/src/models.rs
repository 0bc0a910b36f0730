//! Data model for dependency analysis

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a module reference was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// `import x from 'y'`, `import { a } from 'y'`, `import * as n from 'y'`, `import 'y'`
    Import,
    /// `import type { T } from 'y'`
    TypeImport,
    /// `import('y')`
    DynamicImport,
    /// `require('y')`
    Require,
    /// `export { a } from 'y'`, `export * from 'y'`
    Export,
}

/// A module reference extracted from a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    /// File containing the reference
    pub source: PathBuf,
    /// Raw specifier as written
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// 1-based line of the specifier
    pub line: u32,
    /// 1-based column of the specifier's first character
    pub column: u32,
    /// True unless the specifier is a relative path
    pub is_external: bool,
}

impl DependencyEdge {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<String>,
        edge_type: EdgeType,
        line: u32,
        column: u32,
    ) -> Self {
        let target = target.into();
        Self {
            source: source.into(),
            is_external: !is_relative_specifier(&target),
            target,
            edge_type,
            line,
            column,
        }
    }
}

/// A tracked file and its outgoing edges
#[derive(Debug, Clone)]
pub struct FileNode {
    pub path: PathBuf,
    pub content: String,
    pub edges: Vec<DependencyEdge>,
    pub last_analyzed: DateTime<Utc>,
}

/// Outcome of resolving one specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub specifier: String,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ResolutionResult {
    pub fn resolved(specifier: impl Into<String>, resolved_path: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            resolved: true,
            resolved_path: Some(resolved_path.into()),
            error: None,
            suggestions: None,
        }
    }

    pub fn unresolved(specifier: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            resolved: false,
            resolved_path: None,
            error: Some(error.into()),
            suggestions: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        if !suggestions.is_empty() {
            self.suggestions = Some(suggestions);
        }
        self
    }
}

/// Declared packages of a project, in `package.json` shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_dependency(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), version.into());
        self
    }

    pub fn with_dev_dependency(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.dev_dependencies.insert(name.into(), version.into());
        self
    }

    pub fn with_peer_dependency(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.peer_dependencies.insert(name.into(), version.into());
        self
    }

    /// Whether `package` is declared in any of the three maps
    pub fn declares(&self, package: &str) -> bool {
        self.dependencies.contains_key(package)
            || self.dev_dependencies.contains_key(package)
            || self.peer_dependencies.contains_key(package)
    }

    /// All declared package names
    pub fn declared_packages(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
            .map(String::as_str)
    }
}

/// Aggregate counts over the dependency graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStats {
    pub tracked_files: usize,
    pub total_edges: usize,
    pub external_edges: usize,
    pub unresolved_edges: usize,
}

/// `./x`, `../x`, `.` and `..` are relative; everything else is external
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolve `.` and `..` lexically, without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` cannot climb above the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
