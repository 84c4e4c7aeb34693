//! Version engine
//!
//! Combines the pure version arithmetic of `liftoff-strategies` with the
//! repository history and the package manager.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use liftoff_adapters::{PackageJson, PackageRegistry};
use liftoff_core::error::{Result, VersionError};
use liftoff_core::types::{PackageContext, ReleaseType};
use liftoff_git::GitRepo;
use liftoff_strategies::{determine_version, infer_release_type, validate_version};

/// Version operations for packages of one repository
pub struct VersionEngine<'a> {
    repo: &'a GitRepo,
    registry: Arc<dyn PackageRegistry>,
}

impl<'a> VersionEngine<'a> {
    /// Create an engine reading history from `repo` and writing through `registry`
    pub fn new(repo: &'a GitRepo, registry: Arc<dyn PackageRegistry>) -> Self {
        Self { repo, registry }
    }

    /// Version a release of `pkg` produces.
    ///
    /// A custom release returns `pkg.new_version`, which must already be set.
    pub fn determine(
        &self,
        pkg: &PackageContext,
        release_type: ReleaseType,
        preid: Option<&str>,
    ) -> Result<String> {
        Ok(determine_version(
            &pkg.current_version,
            release_type,
            preid,
            pkg.new_version.as_deref(),
        )?)
    }

    /// Bump type implied by the commits since the package's last tag.
    ///
    /// Falls back to patch when the history cannot be read.
    #[instrument(skip(self, pkg), fields(package = %pkg.name))]
    pub fn analyze_commits(&self, pkg: &PackageContext, tag_prefix: Option<&str>) -> ReleaseType {
        match self.commit_messages(pkg, tag_prefix) {
            Ok(messages) => {
                let release_type = infer_release_type(&messages);
                info!(commits = messages.len(), release_type = %release_type, "analyzed commits");
                release_type
            }
            Err(e) => {
                warn!(error = %e, "commit analysis failed, defaulting to patch");
                ReleaseType::Patch
            }
        }
    }

    fn commit_messages(&self, pkg: &PackageContext, tag_prefix: Option<&str>) -> Result<Vec<String>> {
        let tag = self.repo.get_last_tag(&pkg.name, tag_prefix)?;
        let commits = self.repo.commits_since_tag(&tag)?;
        debug!(tag = %tag, count = commits.len(), "read commits since last tag");
        Ok(commits.iter().map(|c| c.full_message()).collect())
    }

    /// Write `pkg.new_version` with the package manager
    #[instrument(skip(self, pkg), fields(package = %pkg.name))]
    pub fn bump(&self, pkg: &PackageContext) -> Result<()> {
        let version = pkg.new_version.as_deref().ok_or_else(|| {
            VersionError::InvalidInput(format!("no new version set for {}", pkg.name))
        })?;

        self.registry
            .set_version(pkg, version)
            .map_err(|e| VersionError::BumpFailed {
                package: pkg.name.clone(),
                reason: e.to_string(),
            })?;

        info!(from = %pkg.current_version, to = version, "bumped version");
        Ok(())
    }

    /// Check a version string is strict semver
    pub fn validate(&self, version: &str) -> Result<()> {
        Ok(validate_version(version)?)
    }

    /// Pin workspace-internal dependencies of `pkg` to `^{version}` and
    /// upgrade exactly the ones that changed.
    ///
    /// Returns the changed names. Nothing runs when `updates` is empty.
    #[instrument(skip(self, pkg, updates), fields(package = %pkg.name, count = updates.len()))]
    pub fn update_dependencies(
        &self,
        pkg: &PackageContext,
        updates: &BTreeMap<String, String>,
    ) -> Result<Vec<String>> {
        if updates.is_empty() {
            return Ok(Vec::new());
        }

        let path = PackageJson::path_in(&pkg.path);
        let mut manifest = PackageJson::load(&path)?;
        let changed = manifest.pin_dependencies(updates);
        if changed.is_empty() {
            debug!("internal dependencies already pinned");
            return Ok(changed);
        }

        manifest.save(&path)?;
        self.registry.update_dependencies(pkg, &changed)?;
        info!(changed = ?changed, "updated internal dependencies");
        Ok(changed)
    }
}
