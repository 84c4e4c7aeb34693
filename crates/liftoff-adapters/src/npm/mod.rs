//! npm registry gateway

mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use liftoff_core::config::{NpmConfig, PackageManager};
use liftoff_core::error::{AdapterError, Result};
use liftoff_core::types::{PackageContext, PublishOutcome};

use crate::archive::{inspect, ArchiveGuard, PackageArchiveInfo};
use crate::runner::{run_checked, CommandRunner, CommandSpec, SystemCommandRunner};
use crate::traits::{PackageRegistry, UNPUBLISHED_VERSION};
pub use manifest::{PackageJson, DEPENDENCY_SECTIONS};

/// File name `npm pack` gives a package, e.g. `acme-app-1.0.0.tgz` for `@acme/app`
pub fn tarball_name(name: &str, version: &str) -> String {
    format!("{}-{}.tgz", name.trim_start_matches('@').replace('/', "-"), version)
}

/// Version the package is released at
pub(crate) fn release_version(pkg: &PackageContext) -> &str {
    pkg.new_version.as_deref().unwrap_or(&pkg.current_version)
}

/// `npm publish` for `pkg`, shared with the yarn fallback
pub(crate) fn npm_publish_spec(pkg: &PackageContext, config: &NpmConfig) -> CommandSpec {
    let mut spec = CommandSpec::new("npm", &pkg.path)
        .arg("publish")
        .args(["--registry", config.registry.as_str()])
        .args(["--tag", config.tag.as_str()])
        .args(["--access", config.access.as_str()]);
    if let Some(otp) = &config.otp {
        spec = spec.args(["--otp", otp.as_str()]);
    }
    spec
}

/// Run a pack command and inspect the artifact it leaves at `expected`.
///
/// `artifact` maps the command's stdout to the produced file. Both paths
/// are removed before returning, whatever the outcome.
pub(crate) fn pack_and_inspect(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
    expected: PathBuf,
    artifact: impl FnOnce(&str) -> Option<PathBuf>,
) -> Result<PackageArchiveInfo> {
    let _expected = ArchiveGuard::new(&expected);

    let stdout = run_checked(runner, spec)?;
    let path = artifact(&stdout).unwrap_or(expected);
    let guard = ArchiveGuard::new(&path);

    let info = inspect(guard.path())?;
    info!(
        filename = %info.filename,
        size = info.size,
        unpacked_size = info.unpacked_size,
        sha256 = %info.sha256,
        "packed package"
    );
    Ok(info)
}

/// npm CLI gateway
pub struct NpmRegistry {
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl NpmRegistry {
    /// Create a gateway for the workspace at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_runner(root, Arc::new(SystemCommandRunner))
    }

    /// Create a gateway that runs commands through `runner`
    pub fn with_runner(root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageRegistry for NpmRegistry {
    fn kind(&self) -> PackageManager {
        PackageManager::Npm
    }

    #[instrument(skip(self, config), fields(registry = %config.registry))]
    fn validate_auth(&self, config: &NpmConfig) -> Result<String> {
        let spec = CommandSpec::new("npm", &self.root)
            .arg("whoami")
            .args(["--registry", config.registry.as_str()]);

        let failed = |reason: String| AdapterError::AuthenticationFailed {
            registry: config.registry.clone(),
            reason,
            remediation: format!("Run `npm login --registry {}` and try again", config.registry),
        };

        let output = self.runner.run(&spec)?;
        if !output.success {
            return Err(failed(output.failure_reason()).into());
        }
        let user = output.stdout.trim().to_string();
        if user.is_empty() {
            return Err(failed("no identity returned".to_string()).into());
        }

        debug!(user = %user, "authenticated");
        Ok(user)
    }

    #[instrument(skip(self, pkg, config), fields(package = %pkg.name, tag = %config.tag))]
    fn publish(&self, pkg: &PackageContext, config: &NpmConfig) -> Result<PublishOutcome> {
        let start = std::time::Instant::now();
        run_checked(self.runner.as_ref(), &npm_publish_spec(pkg, config))?;

        info!(
            registry = %config.registry,
            duration_ms = start.elapsed().as_millis(),
            "published"
        );
        Ok(PublishOutcome {
            published: true,
            registry: config.registry.clone(),
        })
    }

    fn get_latest_version(&self, name: &str, config: &NpmConfig) -> String {
        let spec = CommandSpec::new("npm", &self.root)
            .args(["view", name, "version"])
            .args(["--registry", config.registry.as_str()]);

        match run_checked(self.runner.as_ref(), &spec) {
            Ok(stdout) if !stdout.trim().is_empty() => stdout.trim().to_string(),
            Ok(_) => UNPUBLISHED_VERSION.to_string(),
            Err(e) => {
                debug!(package = name, error = %e, "no published version");
                UNPUBLISHED_VERSION.to_string()
            }
        }
    }

    fn check_workspace_integrity(&self) -> bool {
        let spec = CommandSpec::new("npm", &self.root).args(["ci", "--dry-run", "--ignore-scripts"]);
        match run_checked(self.runner.as_ref(), &spec) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "workspace integrity check failed");
                false
            }
        }
    }

    #[instrument(skip(self, pkg), fields(package = %pkg.name))]
    fn update_dependencies(&self, pkg: &PackageContext, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let spec = CommandSpec::new("npm", &pkg.path).arg("update").args(names.iter().cloned());
        run_checked(self.runner.as_ref(), &spec)?;
        info!(count = names.len(), "updated dependencies");
        Ok(())
    }

    fn set_version(&self, pkg: &PackageContext, version: &str) -> Result<()> {
        let spec = CommandSpec::new("npm", &pkg.path).args([
            "version",
            version,
            "--no-git-tag-version",
            "--allow-same-version",
        ]);
        run_checked(self.runner.as_ref(), &spec)?;
        Ok(())
    }

    #[instrument(skip(self, pkg), fields(package = %pkg.name))]
    fn pack(&self, pkg: &PackageContext) -> Result<PackageArchiveInfo> {
        let expected = pkg.path.join(tarball_name(&pkg.name, release_version(pkg)));
        let spec = CommandSpec::new("npm", &pkg.path).arg("pack");

        // npm prints the tarball name as the last line
        pack_and_inspect(self.runner.as_ref(), &spec, expected, |stdout| {
            stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .last()
                .map(|name| pkg.path.join(name))
        })
    }

    fn run_script(&self, pkg: &PackageContext, script: &str) -> Result<()> {
        let spec = CommandSpec::new("npm", &pkg.path).args(["run", script]);
        run_checked(self.runner.as_ref(), &spec).map_err(|e| AdapterError::ScriptFailed {
            script: script.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
