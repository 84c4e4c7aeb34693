//! Yarn (berry) registry gateway

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use liftoff_core::config::{NpmConfig, PackageManager};
use liftoff_core::error::{AdapterError, Result};
use liftoff_core::types::{PackageContext, PublishOutcome};

use crate::archive::PackageArchiveInfo;
use crate::npm::{npm_publish_spec, pack_and_inspect, release_version, tarball_name};
use crate::runner::{run_checked, CommandRunner, CommandSpec, SystemCommandRunner};
use crate::traits::{PackageRegistry, UNPUBLISHED_VERSION};

/// Registry yarn publishes to and authenticates against
const PUBLISH_REGISTRY_ENV: &str = "YARN_NPM_PUBLISH_REGISTRY";
/// Registry yarn reads metadata from
const REGISTRY_SERVER_ENV: &str = "YARN_NPM_REGISTRY_SERVER";

/// Yarn CLI gateway
///
/// Publishing falls back to `npm publish` once when `yarn npm publish` fails.
pub struct YarnRegistry {
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl YarnRegistry {
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

    fn publish_spec(pkg: &PackageContext, config: &NpmConfig) -> CommandSpec {
        let mut spec = CommandSpec::new("yarn", &pkg.path)
            .args(["npm", "publish"])
            .args(["--tag", config.tag.as_str()])
            .args(["--access", config.access.as_str()])
            .env(PUBLISH_REGISTRY_ENV, config.registry.as_str());
        if let Some(otp) = &config.otp {
            spec = spec.args(["--otp", otp.as_str()]);
        }
        spec
    }
}

/// Pull `version` out of `yarn npm info --json` output
fn parse_info_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
        .find_map(|value| value.get("version").and_then(Value::as_str).map(String::from))
        .filter(|v| !v.is_empty())
}

impl PackageRegistry for YarnRegistry {
    fn kind(&self) -> PackageManager {
        PackageManager::Yarn
    }

    #[instrument(skip(self, config), fields(registry = %config.registry))]
    fn validate_auth(&self, config: &NpmConfig) -> Result<String> {
        let spec = CommandSpec::new("yarn", &self.root)
            .args(["npm", "whoami", "--publish"])
            .env(PUBLISH_REGISTRY_ENV, config.registry.as_str());

        let failed = |reason: String| AdapterError::AuthenticationFailed {
            registry: config.registry.clone(),
            reason,
            remediation: "Run `yarn npm login --publish` and try again".to_string(),
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

        let yarn_err = match run_checked(self.runner.as_ref(), &Self::publish_spec(pkg, config)) {
            Ok(_) => {
                info!(
                    registry = %config.registry,
                    duration_ms = start.elapsed().as_millis(),
                    "published"
                );
                return Ok(PublishOutcome {
                    published: true,
                    registry: config.registry.clone(),
                });
            }
            Err(e) => e,
        };

        warn!(error = %yarn_err, "yarn publish failed, retrying with npm");
        match run_checked(self.runner.as_ref(), &npm_publish_spec(pkg, config)) {
            Ok(_) => {
                info!(
                    registry = %config.registry,
                    duration_ms = start.elapsed().as_millis(),
                    "published with npm"
                );
                Ok(PublishOutcome {
                    published: true,
                    registry: config.registry.clone(),
                })
            }
            Err(npm_err) => Err(AdapterError::PublishFailed(format!(
                "{}; npm fallback: {}",
                yarn_err, npm_err
            ))
            .into()),
        }
    }

    fn get_latest_version(&self, name: &str, config: &NpmConfig) -> String {
        let spec = CommandSpec::new("yarn", &self.root)
            .args(["npm", "info", name, "--fields", "version", "--json"])
            .env(REGISTRY_SERVER_ENV, config.registry.as_str());

        match run_checked(self.runner.as_ref(), &spec) {
            Ok(stdout) => parse_info_version(&stdout).unwrap_or_else(|| UNPUBLISHED_VERSION.to_string()),
            Err(e) => {
                debug!(package = name, error = %e, "no published version");
                UNPUBLISHED_VERSION.to_string()
            }
        }
    }

    fn check_workspace_integrity(&self) -> bool {
        let spec = CommandSpec::new("yarn", &self.root)
            .args(["install", "--immutable", "--mode=update-lockfile"]);
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
        let spec = CommandSpec::new("yarn", &pkg.path).arg("up").args(names.iter().cloned());
        run_checked(self.runner.as_ref(), &spec)?;
        info!(count = names.len(), "updated dependencies");
        Ok(())
    }

    fn set_version(&self, pkg: &PackageContext, version: &str) -> Result<()> {
        let spec = CommandSpec::new("yarn", &pkg.path).args(["version", version]);
        run_checked(self.runner.as_ref(), &spec)?;
        Ok(())
    }

    #[instrument(skip(self, pkg), fields(package = %pkg.name))]
    fn pack(&self, pkg: &PackageContext) -> Result<PackageArchiveInfo> {
        let filename = tarball_name(&pkg.name, release_version(pkg));
        let spec = CommandSpec::new("yarn", &pkg.path).args(["pack", "--out", filename.as_str()]);
        pack_and_inspect(self.runner.as_ref(), &spec, pkg.path.join(&filename), |_| None)
    }

    fn run_script(&self, pkg: &PackageContext, script: &str) -> Result<()> {
        let spec = CommandSpec::new("yarn", &pkg.path).args(["run", script]);
        run_checked(self.runner.as_ref(), &spec).map_err(|e| AdapterError::ScriptFailed {
            script: script.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
