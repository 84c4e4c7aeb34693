//! Package discovery in monorepos

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use glob::glob;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};
use crate::types::PackageContext;

const MANIFEST: &str = "package.json";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestFields {
    name: Option<String>,
    version: Option<String>,
    private: Option<bool>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
}

/// Parse a package manifest into a context.
///
/// Manifests without a name or version are not releasable and yield `None`.
pub fn read_package(manifest_path: &Path) -> Result<Option<PackageContext>> {
    let content = std::fs::read_to_string(manifest_path)?;
    let manifest: ManifestFields = serde_json::from_str(&content)?;

    let (Some(name), Some(version)) = (manifest.name, manifest.version) else {
        debug!(path = %manifest_path.display(), "skipping manifest without name or version");
        return Ok(None);
    };

    let path = manifest_path
        .parent()
        .unwrap_or(Path::new("."))
        .to_path_buf();

    Ok(Some(PackageContext {
        name,
        path,
        current_version: version,
        new_version: None,
        private: manifest.private.unwrap_or(false),
        dependencies: manifest.dependencies,
        dev_dependencies: manifest.dev_dependencies,
        peer_dependencies: manifest.peer_dependencies,
    }))
}

/// Discover all packages matching the workspace patterns under `root`
pub fn discover_packages(root: &Path, patterns: &[String]) -> Result<Vec<PackageContext>> {
    debug!(root = %root.display(), patterns = patterns.len(), "discovering packages");
    let mut packages = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut names: HashSet<String> = HashSet::new();

    for pattern in patterns {
        let full_pattern = if pattern == "." {
            root.to_string_lossy().to_string()
        } else {
            root.join(pattern).to_string_lossy().to_string()
        };

        let entries = glob(&full_pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        for entry in entries {
            let path = entry.map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;

            let manifest_path = if path.is_dir() {
                path.join(MANIFEST)
            } else if path.file_name().is_some_and(|f| f == MANIFEST) {
                path.clone()
            } else {
                continue;
            };

            if !manifest_path.is_file() || !seen.insert(manifest_path.clone()) {
                continue;
            }

            if let Some(pkg) = read_package(&manifest_path)? {
                if !names.insert(pkg.name.clone()) {
                    warn!(package = %pkg.name, path = %pkg.path.display(), "duplicate package name, skipping");
                    continue;
                }
                packages.push(pkg);
            }
        }
    }

    info!(count = packages.len(), "discovered packages");
    Ok(packages)
}
