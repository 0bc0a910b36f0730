//! File-level dependency graph construction and maintenance

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::analyzer::{normalize_extension, AnalyzerRegistry, LanguageAnalyzer};
use crate::error::{DependencyError, Result};
use crate::models::{
    normalize_path, DependencyEdge, DependencyStats, FileNode, PackageInfo, ResolutionResult,
};

/// Directed graph of tracked files keyed by normalised path
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<PathBuf, FileNode>,
    registry: AnalyzerRegistry,
}

impl DependencyGraph {
    /// Creates an empty graph with the default analyzers
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph using `registry`
    pub fn with_registry(registry: AnalyzerRegistry) -> Self {
        Self {
            nodes: BTreeMap::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Adds a file, replacing any node already stored under the same path.
    ///
    /// Returns true when an existing node was replaced.
    pub async fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) -> bool {
        let path = normalize_path(path.as_ref());
        let node = self.analyze(path.clone(), content.into()).await;
        debug!("Tracking {:?} with {} edges", path, node.edges.len());
        self.nodes.insert(path, node).is_some()
    }

    /// Replaces the content of a tracked file and re-extracts its edges
    pub async fn update_file(
        &mut self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
    ) -> Result<()> {
        let path = normalize_path(path.as_ref());
        if !self.nodes.contains_key(&path) {
            return Err(DependencyError::FileNotTracked(path));
        }

        let node = self.analyze(path.clone(), content.into()).await;
        debug!("Updated {:?}: {} edges", path, node.edges.len());
        self.nodes.insert(path, node);
        Ok(())
    }

    /// Stops tracking a file. Returns false when it was not tracked.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = normalize_path(path.as_ref());
        let removed = self.nodes.remove(&path).is_some();
        if removed {
            debug!("Stopped tracking {:?}", path);
        }
        removed
    }

    /// Installs an analyzer and re-extracts edges for tracked files whose
    /// extension it now owns. Returns the number of re-analysed files.
    pub async fn register_analyzer(&mut self, analyzer: Arc<dyn LanguageAnalyzer>) -> usize {
        let claimed: BTreeSet<String> = self.registry.register(analyzer).into_iter().collect();

        let affected: Vec<PathBuf> = self
            .nodes
            .keys()
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| claimed.contains(&normalize_extension(ext)))
            })
            .cloned()
            .collect();

        for path in &affected {
            if let Some(content) = self.nodes.get(path).map(|n| n.content.clone()) {
                let node = self.analyze(path.clone(), content).await;
                self.nodes.insert(path.clone(), node);
            }
        }
        affected.len()
    }

    pub fn node(&self, path: impl AsRef<Path>) -> Option<&FileNode> {
        self.nodes.get(&normalize_path(path.as_ref()))
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.node(path).is_some()
    }

    /// Tracked nodes in path order
    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    /// Every edge of every tracked file, in path then position order
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.nodes.values().flat_map(|node| node.edges.iter())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Resolve an edge through the analyzer that owns its source file
    pub async fn resolve_edge(
        &self,
        edge: &DependencyEdge,
        package_info: Option<&PackageInfo>,
    ) -> ResolutionResult {
        self.registry
            .resolve(&edge.target, &edge.source, package_info)
            .await
    }

    /// The tracked file an internal edge points at.
    ///
    /// Probes the normalised target, then the target with each registered
    /// extension, then `<target>/index.<ext>`.
    pub fn resolve_internal_target(&self, edge: &DependencyEdge) -> Option<&Path> {
        if edge.is_external {
            return None;
        }

        let base = edge.source.parent().unwrap_or_else(|| Path::new(""));
        let target = normalize_path(&base.join(&edge.target));
        let extensions = self.registry.extensions();

        let candidates = std::iter::once(target.clone())
            .chain(extensions.iter().map(|ext| with_extension_suffix(&target, ext)))
            .chain(
                extensions
                    .iter()
                    .map(|ext| target.join(format!("index.{}", ext))),
            );

        for candidate in candidates {
            if let Some((path, _)) = self.nodes.get_key_value(&candidate) {
                return Some(path.as_path());
            }
        }
        None
    }

    /// Internal edges mapped onto tracked files, for every tracked file
    pub fn adjacency(&self) -> BTreeMap<PathBuf, BTreeSet<PathBuf>> {
        self.nodes
            .iter()
            .map(|(path, node)| {
                let targets = node
                    .edges
                    .iter()
                    .filter_map(|edge| self.resolve_internal_target(edge))
                    .map(Path::to_path_buf)
                    .collect();
                (path.clone(), targets)
            })
            .collect()
    }

    /// Counts over the current graph; unresolved edges are counted against
    /// `package_info`
    pub async fn stats(&self, package_info: Option<&PackageInfo>) -> DependencyStats {
        let mut stats = DependencyStats {
            tracked_files: self.nodes.len(),
            ..Default::default()
        };

        for edge in self.edges() {
            stats.total_edges += 1;
            if edge.is_external {
                stats.external_edges += 1;
            }
            if !self.resolve_edge(edge, package_info).await.resolved {
                stats.unresolved_edges += 1;
            }
        }
        stats
    }

    async fn analyze(&self, path: PathBuf, content: String) -> FileNode {
        let edges = self.registry.extract(&path, &content).await;
        FileNode {
            path,
            content,
            edges,
            last_analyzed: Utc::now(),
        }
    }
}

fn with_extension_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}
