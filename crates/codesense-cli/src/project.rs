// Project discovery: feeds source files and the manifest into a sensor

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{bail, Context};
use codesense_deps::{DependencySensor, MANIFEST_FILE};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

/// Directory never descended into, even when not ignored
const PACKAGE_DIR: &str = "node_modules";

/// What a [`ProjectFiles::sync`] pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

impl SyncSummary {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Source files of a project root, tracked by modification time
#[derive(Debug)]
pub struct ProjectFiles {
    root: PathBuf,
    seen: BTreeMap<PathBuf, Option<SystemTime>>,
}

impl ProjectFiles {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("project root {} is not a directory", root.display());
        }
        Ok(Self {
            root,
            seen: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Install `<root>/package.json` into `sensor` when present.
    ///
    /// A missing or unreadable manifest is logged and leaves the sensor
    /// without package info.
    pub async fn load_manifest(&self, sensor: &DependencySensor) -> bool {
        if !self.root.join(MANIFEST_FILE).is_file() {
            info!(
                "No {} in {}; bare imports cannot be checked against declared packages",
                MANIFEST_FILE,
                self.root.display()
            );
            return false;
        }

        match sensor.load_package_info(&self.root).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Files under the root with one of `extensions`, relative to the root.
    ///
    /// Honours `.gitignore` and skips hidden entries and `node_modules`.
    pub fn discover(&self, extensions: &[String]) -> Vec<(PathBuf, Option<SystemTime>)> {
        let wanted: BTreeSet<String> = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .filter_entry(|entry| entry.file_name() != PACKAGE_DIR)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| wanted.contains(&ext.to_ascii_lowercase()));
            if !matches {
                continue;
            }

            let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
            let relative = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
            files.push((relative, modified));
        }
        files.sort();
        files
    }

    /// Bring `sensor` in line with the files on disk.
    ///
    /// New files are added, files whose modification time changed are
    /// re-read, and files that disappeared are removed.
    pub async fn sync(&mut self, sensor: &DependencySensor) -> anyhow::Result<SyncSummary> {
        let extensions = sensor.extensions().await;
        let discovered = self.discover(&extensions);
        let mut summary = SyncSummary::default();

        let present: BTreeSet<PathBuf> = discovered.iter().map(|(p, _)| p.clone()).collect();
        let gone: Vec<PathBuf> = self
            .seen
            .keys()
            .filter(|p| !present.contains(*p))
            .cloned()
            .collect();
        for path in gone {
            self.seen.remove(&path);
            if sensor.remove_file(&path).await {
                summary.removed += 1;
            }
        }

        for (relative, modified) in discovered {
            let known = self.seen.get(&relative);
            if known.is_some_and(|previous| previous.is_some() && *previous == modified) {
                continue;
            }

            let content = match tokio::fs::read_to_string(self.root.join(&relative)).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping {}: {}", relative.display(), e);
                    continue;
                }
            };

            if known.is_some() {
                sensor
                    .update_file(&relative, content)
                    .await
                    .with_context(|| format!("failed to update {}", relative.display()))?;
                summary.updated += 1;
            } else {
                sensor.add_file(&relative, content).await;
                summary.added += 1;
            }
            self.seen.insert(relative, modified);
        }

        if !summary.is_empty() {
            debug!(
                "Synced {}: +{} ~{} -{}",
                self.root.display(),
                summary.added,
                summary.updated,
                summary.removed
            );
        }
        Ok(summary)
    }
}
