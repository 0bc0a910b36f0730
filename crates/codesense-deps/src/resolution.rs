//! Module specifier resolution
//!
//! Resolution is purely lexical: builtins come from a fixed allowlist, relative
//! specifiers are joined against the importing file's directory, and bare
//! specifiers are looked up in the declared packages of the current
//! [`PackageInfo`]. Nothing here touches the filesystem.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::trace;

use crate::models::{is_relative_specifier, normalize_path, PackageInfo, ResolutionResult};

/// Prefix of resolved paths that denote runtime builtins
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Directory that resolved package paths are reported under
pub const PACKAGE_ROOT: &str = "node_modules";

const NODE_SCHEME: &str = "node:";

/// Largest edit distance at which a declared package counts as a likely typo
const MAX_TYPO_DISTANCE: usize = 2;

const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Only reachable through the `node:` scheme
const SCHEME_ONLY_BUILTINS: &[&str] = &["test", "sea", "sqlite"];

const DEPRECATED_PACKAGES: &[(&str, &[&str])] = &[
    ("moment", &["date-fns", "dayjs", "luxon"]),
    ("request", &["axios", "node-fetch", "got"]),
    ("request-promise", &["axios"]),
    ("node-sass", &["sass"]),
    ("tslint", &["eslint", "typescript-eslint"]),
    ("babel-eslint", &["@babel/eslint-parser"]),
    ("colors", &["chalk", "picocolors"]),
    ("left-pad", &["String.prototype.padStart"]),
];

/// Resolves specifiers against builtins, relative paths and declared packages
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    builtins: HashSet<&'static str>,
    alternatives: HashMap<String, Vec<String>>,
}

impl Default for ResolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionEngine {
    pub fn new() -> Self {
        let alternatives = DEPRECATED_PACKAGES
            .iter()
            .map(|(name, alts)| {
                (
                    name.to_string(),
                    alts.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();

        Self {
            builtins: NODE_BUILTINS.iter().copied().collect(),
            alternatives,
        }
    }

    /// Register (or replace) the suggested replacements for a package
    pub fn with_alternatives<I, T>(mut self, package: impl Into<String>, alternatives: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.alternatives.insert(
            package.into(),
            alternatives.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Resolve `specifier` as written in `from_file`
    pub fn resolve(
        &self,
        specifier: &str,
        from_file: &Path,
        package_info: Option<&PackageInfo>,
    ) -> ResolutionResult {
        if specifier.trim().is_empty() {
            return ResolutionResult::unresolved(specifier, "empty module specifier");
        }

        if let Some(builtin) = self.builtin_name(specifier) {
            return ResolutionResult::resolved(specifier, format!("{}{}", BUILTIN_PREFIX, builtin));
        }

        if is_relative_specifier(specifier) {
            let base = from_file.parent().unwrap_or_else(|| Path::new(""));
            let joined = normalize_path(&base.join(specifier));
            return ResolutionResult::resolved(specifier, joined.to_string_lossy());
        }

        let package = package_name(specifier);
        if package_info.is_some_and(|info| info.declares(package)) {
            return ResolutionResult::resolved(specifier, format!("{}/{}", PACKAGE_ROOT, package));
        }

        trace!("Unresolved module specifier {:?} in {:?}", specifier, from_file);
        ResolutionResult::unresolved(
            specifier,
            format!("cannot resolve module '{}'", specifier),
        )
        .with_suggestions(self.suggestions_for(package, package_info))
    }

    /// The builtin module a specifier names, without any `node:` scheme
    pub fn builtin_name<'a>(&self, specifier: &'a str) -> Option<&'a str> {
        let (name, scheme) = match specifier.strip_prefix(NODE_SCHEME) {
            Some(rest) => (rest, true),
            None => (specifier, false),
        };
        let root = name.split('/').next().unwrap_or(name);

        let known = self.builtins.contains(root)
            || (scheme && SCHEME_ONLY_BUILTINS.contains(&root));
        known.then_some(name)
    }

    /// Replacement packages for deprecated names, otherwise close declared names
    pub fn suggestions_for(&self, package: &str, package_info: Option<&PackageInfo>) -> Vec<String> {
        if let Some(alternatives) = self.alternatives.get(package) {
            return alternatives.clone();
        }

        let Some(info) = package_info else {
            return Vec::new();
        };

        let mut candidates: Vec<(usize, &str)> = info
            .declared_packages()
            .filter(|declared| *declared != package)
            .map(|declared| (strsim::damerau_levenshtein(package, declared), declared))
            .filter(|(distance, _)| {
                *distance <= MAX_TYPO_DISTANCE && *distance < package.chars().count()
            })
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates
            .into_iter()
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

/// Top-level package of a bare specifier: `@scope/name` or the first segment
pub fn package_name(specifier: &str) -> &str {
    let mut segments = specifier.splitn(3, '/');
    let first = segments.next().unwrap_or(specifier);
    if first.starts_with('@') {
        if let Some(second) = segments.next() {
            return &specifier[..first.len() + 1 + second.len()];
        }
    }
    first
}
