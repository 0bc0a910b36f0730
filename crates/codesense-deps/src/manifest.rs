//! Loading `package.json` into a [`PackageInfo`] snapshot

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{DependencyError, Result};
use crate::models::PackageInfo;

/// Manifest file name looked up in a project root
pub const MANIFEST_FILE: &str = "package.json";

impl PackageInfo {
    /// Parse a `package.json` document.
    ///
    /// Unknown keys are ignored and dependency entries whose version is not a
    /// string (e.g. malformed workspaces) are skipped.
    pub fn from_manifest(content: &str) -> Result<Self> {
        let manifest: Value = serde_json::from_str(content)?;
        if !manifest.is_object() {
            return Err(DependencyError::ManifestFailed {
                path: PathBuf::from(MANIFEST_FILE),
                reason: "top-level value is not an object".to_string(),
            });
        }

        Ok(Self {
            name: string_field(&manifest, "name"),
            version: string_field(&manifest, "version"),
            dependencies: dependency_map(&manifest, "dependencies"),
            dev_dependencies: dependency_map(&manifest, "devDependencies"),
            peer_dependencies: dependency_map(&manifest, "peerDependencies"),
        })
    }
}

/// Read `<root>/package.json`
pub async fn load_package_info(project_root: &Path) -> Result<PackageInfo> {
    let path = project_root.join(MANIFEST_FILE);
    debug!("Loading package manifest from {:?}", path);

    let content =
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DependencyError::ManifestFailed {
                path: path.clone(),
                reason: format!("Failed to read {}: {}", MANIFEST_FILE, e),
            })?;

    PackageInfo::from_manifest(&content).map_err(|e| DependencyError::ManifestFailed {
        path,
        reason: format!("Failed to parse {}: {}", MANIFEST_FILE, e),
    })
}

fn string_field(manifest: &Value, key: &str) -> String {
    manifest
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn dependency_map(manifest: &Value, key: &str) -> BTreeMap<String, String> {
    manifest
        .get(key)
        .and_then(Value::as_object)
        .map(|deps| {
            deps.iter()
                .filter_map(|(name, version)| {
                    version.as_str().map(|v| (name.clone(), v.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}
