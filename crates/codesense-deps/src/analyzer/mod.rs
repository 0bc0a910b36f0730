//! Language analyzers and the extension-keyed registry
//!
//! An analyzer turns file content into [`DependencyEdge`]s and resolves the
//! specifiers it produced. The registry picks the analyzer by file extension;
//! files nobody claims contribute no edges.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{DependencyEdge, PackageInfo, ResolutionResult};
use crate::resolution::ResolutionEngine;

mod javascript;

pub use javascript::JavaScriptAnalyzer;

/// Extracts and resolves module references for one language family
#[async_trait]
pub trait LanguageAnalyzer: Send + Sync {
    /// Language tag, e.g. `typescript`
    fn language(&self) -> &str;

    /// Extensions claimed by this analyzer, with or without a leading dot
    fn extensions(&self) -> &[&str];

    /// Extract every module reference in `content`
    async fn extract_edges(&self, content: &str, file_path: &Path) -> Result<Vec<DependencyEdge>>;

    /// Resolve a specifier written in `from_file`
    async fn resolve_specifier(
        &self,
        specifier: &str,
        from_file: &Path,
        package_info: Option<&PackageInfo>,
    ) -> ResolutionResult;
}

/// Maps file extensions to analyzers
#[derive(Clone)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<dyn LanguageAnalyzer>>,
    fallback: ResolutionEngine,
}

impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AnalyzerRegistry {
    /// A registry with no analyzers
    pub fn empty() -> Self {
        Self {
            analyzers: HashMap::new(),
            fallback: ResolutionEngine::new(),
        }
    }

    /// A registry with the JavaScript/TypeScript analyzer installed
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(JavaScriptAnalyzer::new()));
        registry
    }

    /// Install `analyzer` for each extension it claims, replacing any previous
    /// owner. Returns the normalised extensions.
    pub fn register(&mut self, analyzer: Arc<dyn LanguageAnalyzer>) -> Vec<String> {
        let mut claimed = Vec::new();
        for ext in analyzer.extensions() {
            let key = normalize_extension(ext);
            if key.is_empty() {
                continue;
            }
            if let Some(previous) = self.analyzers.insert(key.clone(), Arc::clone(&analyzer)) {
                debug!(
                    "Extension .{} moved from {} to {} analyzer",
                    key,
                    previous.language(),
                    analyzer.language()
                );
            }
            claimed.push(key);
        }
        debug!(
            "Registered {} analyzer for {:?}",
            analyzer.language(),
            claimed
        );
        claimed
    }

    /// The analyzer claiming `path`'s extension
    pub fn analyzer_for(&self, path: &Path) -> Option<&Arc<dyn LanguageAnalyzer>> {
        let ext = path.extension()?.to_str()?;
        self.analyzers.get(&normalize_extension(ext))
    }

    /// Registered extensions, sorted, without leading dots
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.analyzers.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    /// Extract edges from `content`; unclaimed files and analyzer failures
    /// yield no edges.
    pub async fn extract(&self, path: &Path, content: &str) -> Vec<DependencyEdge> {
        let Some(analyzer) = self.analyzer_for(path) else {
            debug!("No analyzer registered for {:?}", path);
            return Vec::new();
        };

        match analyzer.extract_edges(content, path).await {
            Ok(edges) => edges,
            Err(e) => {
                warn!(
                    "{} analyzer failed on {:?}: {}",
                    analyzer.language(),
                    path,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Resolve through the analyzer owning `from_file`, falling back to the
    /// default resolution rules
    pub async fn resolve(
        &self,
        specifier: &str,
        from_file: &Path,
        package_info: Option<&PackageInfo>,
    ) -> ResolutionResult {
        match self.analyzer_for(from_file) {
            Some(analyzer) => {
                analyzer
                    .resolve_specifier(specifier, from_file, package_info)
                    .await
            }
            None => self.fallback.resolve(specifier, from_file, package_info),
        }
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DependencyError;
    use crate::models::EdgeType;

    struct BrokenAnalyzer;

    #[async_trait]
    impl LanguageAnalyzer for BrokenAnalyzer {
        fn language(&self) -> &str {
            "broken"
        }

        fn extensions(&self) -> &[&str] {
            &[".ts", "vue"]
        }

        async fn extract_edges(
            &self,
            _content: &str,
            file_path: &Path,
        ) -> Result<Vec<DependencyEdge>> {
            Err(DependencyError::ExtractionFailed {
                path: file_path.to_path_buf(),
                reason: "unsupported syntax".to_string(),
            })
        }

        async fn resolve_specifier(
            &self,
            specifier: &str,
            _from_file: &Path,
            _package_info: Option<&PackageInfo>,
        ) -> ResolutionResult {
            ResolutionResult::resolved(specifier, "broken")
        }
    }

    #[test]
    fn test_default_extensions() {
        let registry = AnalyzerRegistry::with_defaults();
        assert_eq!(
            registry.extensions(),
            vec!["cjs", "cts", "js", "jsx", "mjs", "mts", "ts", "tsx"]
        );
        assert!(registry.analyzer_for(Path::new("src/App.TSX")).is_some());
        assert!(registry.analyzer_for(Path::new("README.md")).is_none());
        assert!(registry.analyzer_for(Path::new("Makefile")).is_none());
    }

    #[tokio::test]
    async fn test_unknown_extension_yields_no_edges() {
        let registry = AnalyzerRegistry::with_defaults();
        let edges = registry
            .extract(Path::new("main.py"), "import os\nfrom x import y\n")
            .await;
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn test_register_is_upsert_and_failures_are_contained() {
        let mut registry = AnalyzerRegistry::with_defaults();
        let claimed = registry.register(Arc::new(BrokenAnalyzer));
        assert_eq!(claimed, vec!["ts".to_string(), "vue".to_string()]);

        let ts = Path::new("src/a.ts");
        assert_eq!(registry.analyzer_for(ts).unwrap().language(), "broken");
        assert!(registry.extract(ts, "import x from 'y';").await.is_empty());

        // other extensions keep the default analyzer
        let edges = registry
            .extract(Path::new("src/b.js"), "const y = require('y');")
            .await;
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, EdgeType::Require);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_without_analyzer() {
        let registry = AnalyzerRegistry::empty();
        let result = registry
            .resolve("./util", Path::new("lib/a.vue"), None)
            .await;
        assert!(result.resolved);
        assert_eq!(result.resolved_path.as_deref(), Some("lib/util"));
    }
}
