//! Pattern-based import extraction for JavaScript and TypeScript
//!
//! The whole file is scanned with regular expressions, so references that
//! appear inside string literals or comments are reported as well. That is a
//! known limitation of the approach; a parser-backed analyzer can replace this
//! one through [`super::AnalyzerRegistry::register`].

use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::LanguageAnalyzer;
use crate::error::Result;
use crate::models::{DependencyEdge, EdgeType, PackageInfo, ResolutionResult};
use crate::resolution::ResolutionEngine;

const EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];

/// `'x'` or `"x"`, captured as `sq` / `dq`
const QUOTED: &str = r#"(?:'(?P<sq>[^'\r\n]+)'|"(?P<dq>[^"\r\n]+)")"#;

// import x from 'y' | import { a, b } from 'y' | import * as n from 'y' | import type { T } from 'y'
static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"\bimport\s+(?P<kw>type\s+)?(?P<clause>[^;'"()`]*?)\bfrom\s*{}"#,
        QUOTED
    ))
    .expect("import-from pattern")
});

// import './polyfills'
static SIDE_EFFECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"\bimport\s*{}"#, QUOTED)).expect("side-effect import pattern")
});

// import('./lazy') and import(`./lazy`)
static DYNAMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"\bimport\s*\(\s*(?:{}|`(?P<bt>[^`$\r\n]+)`)\s*\)"#,
        QUOTED
    ))
    .expect("dynamic import pattern")
});

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"\brequire\s*\(\s*{}\s*\)"#, QUOTED)).expect("require pattern")
});

// export * from 'y' | export * as n from 'y' | export { a } from 'y' | export type { T } from 'y'
static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{{[^}}]*\}})\s*from\s*{}"#,
        QUOTED
    ))
    .expect("export-from pattern")
});

/// Analyzer for `.ts .tsx .js .jsx .mjs .cjs .mts .cts`
#[derive(Debug, Clone, Default)]
pub struct JavaScriptAnalyzer {
    engine: ResolutionEngine,
}

impl JavaScriptAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a customised resolution engine
    pub fn with_engine(engine: ResolutionEngine) -> Self {
        Self { engine }
    }

    /// Synchronous core of [`LanguageAnalyzer::extract_edges`]
    pub fn scan(&self, content: &str, file_path: &Path) -> Vec<DependencyEdge> {
        let lines = LineIndex::new(content);
        let mut edges = Vec::new();

        let mut push = |caps: &Captures<'_>, edge_type: EdgeType| {
            if let Some(spec) = specifier(caps) {
                let (line, column) = lines.position(content, spec.start());
                edges.push(DependencyEdge::new(
                    file_path,
                    spec.as_str(),
                    edge_type,
                    line,
                    column,
                ));
            }
        };

        for caps in IMPORT_FROM.captures_iter(content) {
            let type_only = caps.name("kw").is_some()
                && caps
                    .name("clause")
                    .is_some_and(|c| !c.as_str().trim().is_empty());
            let edge_type = if type_only {
                EdgeType::TypeImport
            } else {
                EdgeType::Import
            };
            push(&caps, edge_type);
        }
        for caps in SIDE_EFFECT.captures_iter(content) {
            push(&caps, EdgeType::Import);
        }
        for caps in DYNAMIC.captures_iter(content) {
            push(&caps, EdgeType::DynamicImport);
        }
        for caps in REQUIRE.captures_iter(content) {
            push(&caps, EdgeType::Require);
        }
        for caps in EXPORT_FROM.captures_iter(content) {
            push(&caps, EdgeType::Export);
        }

        // one edge per specifier occurrence
        edges.sort_by_key(|e| (e.line, e.column));
        edges.dedup_by_key(|e| (e.line, e.column));
        edges
    }
}

#[async_trait]
impl LanguageAnalyzer for JavaScriptAnalyzer {
    fn language(&self) -> &str {
        "javascript"
    }

    fn extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    async fn extract_edges(&self, content: &str, file_path: &Path) -> Result<Vec<DependencyEdge>> {
        Ok(self.scan(content, file_path))
    }

    async fn resolve_specifier(
        &self,
        specifier: &str,
        from_file: &Path,
        package_info: Option<&PackageInfo>,
    ) -> ResolutionResult {
        self.engine.resolve(specifier, from_file, package_info)
    }
}

/// The quoted specifier of a match; blank specifiers yield no edge
fn specifier<'a>(caps: &Captures<'a>) -> Option<regex::Match<'a>> {
    caps.name("sq")
        .or_else(|| caps.name("dq"))
        .or_else(|| caps.name("bt"))
        .filter(|m| !m.as_str().trim().is_empty())
}

/// Byte offsets of line starts, for offset -> (line, column) lookups
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// 1-based line and character column of a byte offset
    fn position(&self, content: &str, offset: usize) -> (u32, u32) {
        let line_idx = self.starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.starts[line_idx];
        let column = content[line_start..offset].chars().count() + 1;
        (line_idx as u32 + 1, column as u32)
    }
}
