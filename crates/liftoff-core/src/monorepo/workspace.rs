//! Workspace index

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::WorkspaceConfig;
use crate::error::{AdapterError, Result, WorkflowError};
use crate::types::PackageContext;

use super::discovery::discover_packages;

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Array(Vec<String>),
    Object { packages: Vec<String> },
}

#[derive(Deserialize)]
struct RootManifest {
    workspaces: Option<WorkspacesField>,
}

/// Packages of a monorepo and the scopes that mark them as internal
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root
    pub root: PathBuf,
    /// Glob patterns from the root manifest
    pub package_patterns: Vec<String>,
    /// Scope prefixes identifying workspace-internal dependencies
    pub internal_scopes: Vec<String>,
    packages: Vec<PackageContext>,
}

impl Workspace {
    /// Read the root manifest and discover every package
    pub fn load(root: &Path, config: &WorkspaceConfig) -> Result<Self> {
        let manifest_path = root.join("package.json");
        if !manifest_path.is_file() {
            return Err(AdapterError::ManifestNotFound(manifest_path).into());
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest: RootManifest = serde_json::from_str(&content)?;

        let package_patterns = match manifest.workspaces {
            Some(WorkspacesField::Array(patterns)) => patterns,
            Some(WorkspacesField::Object { packages }) => packages,
            None => {
                debug!(root = %root.display(), "no workspaces field, treating root as single package");
                vec![".".to_string()]
            }
        };

        let packages = discover_packages(root, &package_patterns)?;
        Ok(Self::from_packages(root, package_patterns, packages, config))
    }

    /// Build an index over already-discovered packages
    pub fn from_packages(
        root: &Path,
        package_patterns: Vec<String>,
        packages: Vec<PackageContext>,
        config: &WorkspaceConfig,
    ) -> Self {
        let internal_scopes = if config.internal_scopes.is_empty() {
            infer_scopes(&packages)
        } else {
            config.internal_scopes.clone()
        };
        info!(
            root = %root.display(),
            packages = packages.len(),
            scopes = ?internal_scopes,
            "workspace indexed"
        );

        Self {
            root: root.to_path_buf(),
            package_patterns,
            internal_scopes,
            packages,
        }
    }

    /// All packages in discovery order
    pub fn packages(&self) -> &[PackageContext] {
        &self.packages
    }

    /// Look up a package by name
    pub fn package(&self, name: &str) -> Result<&PackageContext> {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| WorkflowError::PackageNotFound(name.to_string()).into())
    }

    /// Whether a dependency name carries an internal scope prefix
    pub fn is_internal(&self, dependency: &str) -> bool {
        self.internal_scopes
            .iter()
            .any(|scope| dependency.starts_with(scope.as_str()))
    }

    /// Internal dependencies of `pkg` mapped to their current workspace versions
    pub fn internal_updates(&self, pkg: &PackageContext) -> BTreeMap<String, String> {
        pkg.all_dependency_names()
            .filter(|name| self.is_internal(name))
            .filter_map(|name| {
                self.packages
                    .iter()
                    .find(|p| &p.name == name)
                    .map(|p| (name.clone(), p.current_version.clone()))
            })
            .collect()
    }

    /// Record that a package was released at `version`
    pub fn record_release(&mut self, name: &str, version: &str) {
        if let Some(pkg) = self.packages.iter_mut().find(|p| p.name == name) {
            pkg.current_version = version.to_string();
            pkg.new_version = None;
        }
    }
}

fn infer_scopes(packages: &[PackageContext]) -> Vec<String> {
    packages
        .iter()
        .filter_map(|p| {
            let rest = p.name.strip_prefix('@')?;
            let (scope, _) = rest.split_once('/')?;
            Some(format!("@{}/", scope))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_yarn_object_workspaces() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{"name":"root","private":true,"workspaces":{"packages":["packages/*"]}}"#,
        );
        write(
            &temp.path().join("packages/core/package.json"),
            r#"{"name":"@acme/core","version":"1.2.0"}"#,
        );
        write(
            &temp.path().join("packages/ui/package.json"),
            r#"{"name":"@acme/ui","version":"0.3.0","dependencies":{"@acme/core":"^1.0.0","react":"^18.0.0"}}"#,
        );

        let ws = Workspace::load(temp.path(), &WorkspaceConfig::default()).unwrap();
        assert_eq!(ws.package_patterns, vec!["packages/*"]);
        assert_eq!(ws.packages().len(), 2);
        assert_eq!(ws.internal_scopes, vec!["@acme/"]);

        let ui = ws.package("@acme/ui").unwrap();
        let updates = ws.internal_updates(ui);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates["@acme/core"], "1.2.0");
        assert!(!ws.is_internal("react"));
    }

    #[test]
    fn test_load_single_package() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{"name":"solo","version":"0.1.0"}"#,
        );

        let ws = Workspace::load(temp.path(), &WorkspaceConfig::default()).unwrap();
        assert_eq!(ws.packages().len(), 1);
        assert!(ws.internal_scopes.is_empty());
        assert!(ws.package("missing").is_err());
    }

    #[test]
    fn test_configured_scopes_and_record_release() {
        let packages = vec![
            PackageContext::new("@acme/core", "/ws/core", "1.0.0"),
            PackageContext::new("@acme/app", "/ws/app", "1.0.0")
                .with_peer_dependency("@acme/core", "^1.0.0")
                .with_dependency("@other/lib", "^2.0.0"),
        ];
        let config = WorkspaceConfig {
            internal_scopes: vec!["@acme/".to_string(), "@other/".to_string()],
        };
        let mut ws = Workspace::from_packages(Path::new("/ws"), vec![], packages, &config);

        ws.record_release("@acme/core", "2.0.0");
        let app = ws.package("@acme/app").unwrap().clone();
        let updates = ws.internal_updates(&app);
        // @other/lib is internal by scope but not part of this workspace
        assert_eq!(updates.len(), 1);
        assert_eq!(updates["@acme/core"], "2.0.0");
    }

    #[test]
    fn test_missing_root_manifest() {
        let temp = TempDir::new().unwrap();
        assert!(Workspace::load(temp.path(), &WorkspaceConfig::default()).is_err());
    }
}
