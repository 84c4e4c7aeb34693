//! Release orchestration
//!
//! A package release runs these steps in order, stopping at the first
//! failure:
//!
//! 1. resolve the effective configuration
//! 2. validate git status, lockfile integrity and registry authentication
//! 3. determine the new version
//! 4. prepare the changelog text
//! 5. confirm the plan (skipped for dry runs, which stop here)
//! 6. run pre-release hooks, write the version, pin internal dependencies
//!    and update the changelog
//! 7. tag, then commit
//! 8. push and publish, when enabled
//! 9. run post-release hooks
//!
//! Nothing is rolled back after a failure. Tags and commits already created
//! stay in place; rerunning with `force` recreates the tag.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use liftoff_adapters::{registry_for, PackageRegistry, UNPUBLISHED_VERSION};
use liftoff_changelog::{ChangelogEngine, ChangelogFile};
use liftoff_core::config::{
    load_config_or_default, validate_config, validate_release_config, BumpStrategy, Config,
    ConfigResolver, NpmConfig, PackageManager, ReleaseConfig,
};
use liftoff_core::error::{LiftoffError, Result, WorkflowError};
use liftoff_core::hooks::{HookContext, HookRunner, HookStage};
use liftoff_core::types::{PackageContext, ReleaseResult, ReleaseStage, ReleaseType};
use liftoff_core::Workspace;
use liftoff_git::{GitRepo, StatusOptions};
use liftoff_strategies::SemVerStrategy;

use crate::integrity::IntegrityChecker;
use crate::prompt::{ReleasePlan, ReleasePrompter};
use crate::version::VersionEngine;

/// Options for one release invocation
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Compute everything, change nothing
    pub dry_run: bool,
    /// Bump type overriding the configured strategy
    pub release_type: Option<ReleaseType>,
    /// Explicit version; implies a custom release
    pub new_version: Option<String>,
    /// Pre-release identifier overriding the configured one
    pub preid: Option<String>,
    /// Skip the git status validation entirely
    pub skip_git_status: bool,
    /// Accept an untracked branch
    pub skip_upstream_tracking: bool,
    /// Ignore behind-remote and branch checks, recreate existing tags and force-push
    pub force: bool,
}

impl ReleaseOptions {
    /// Options for a dry run
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }

    /// Set release type
    pub fn with_release_type(mut self, release_type: ReleaseType) -> Self {
        self.release_type = Some(release_type);
        self
    }

    /// Set explicit version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.new_version = Some(version.into());
        self
    }

    /// Set pre-release identifier
    pub fn with_preid(mut self, preid: impl Into<String>) -> Self {
        self.preid = Some(preid.into());
        self
    }

    /// Skip git status validation
    pub fn skip_git_status(mut self) -> Self {
        self.skip_git_status = true;
        self
    }

    /// Set force mode
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Stage tracking for one package
struct Progress<'a> {
    package: &'a str,
    stage: ReleaseStage,
}

impl<'a> Progress<'a> {
    fn new(package: &'a str) -> Self {
        Self {
            package,
            stage: ReleaseStage::Idle,
        }
    }

    fn enter(&mut self, stage: ReleaseStage) {
        debug!(package = self.package, from = %self.stage, to = %stage, "release stage");
        self.stage = stage;
    }
}

/// Sequences validation, versioning, changelog, git and registry steps
/// for the packages of one workspace
pub struct ReleaseOrchestrator {
    root: PathBuf,
    resolver: ConfigResolver,
    workspace: Workspace,
    repo: GitRepo,
    prompter: Box<dyn ReleasePrompter>,
    registries: HashMap<PackageManager, Arc<dyn PackageRegistry>>,
}

impl ReleaseOrchestrator {
    /// Load configuration, workspace and repository for the workspace at `root`
    pub fn new(root: &Path, prompter: Box<dyn ReleasePrompter>) -> Result<Self> {
        let (config, path) = load_config_or_default(root)?;
        if let Some(path) = &path {
            info!(config = %path.display(), "loaded configuration");
        }
        let workspace = Workspace::load(root, &config.workspace)?;
        let repo = GitRepo::discover(root)?;
        Self::from_parts(root, config, workspace, repo, prompter)
    }

    /// Assemble an orchestrator from already-loaded parts
    pub fn from_parts(
        root: impl Into<PathBuf>,
        config: Config,
        workspace: Workspace,
        repo: GitRepo,
        prompter: Box<dyn ReleasePrompter>,
    ) -> Result<Self> {
        validate_config(&config)?;
        let resolver = ConfigResolver::new(&config)?;

        Ok(Self {
            root: root.into(),
            resolver,
            workspace,
            repo,
            prompter,
            registries: HashMap::new(),
        })
    }

    /// Use `registry` for every package configured with its package manager
    pub fn with_registry(mut self, registry: Arc<dyn PackageRegistry>) -> Self {
        self.registries.insert(registry.kind(), registry);
        self
    }

    /// Workspace index, including versions recorded by releases in this run
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Repository the release operates on
    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    fn registry(&self, manager: PackageManager) -> Arc<dyn PackageRegistry> {
        match self.registries.get(&manager) {
            Some(registry) => Arc::clone(registry),
            None => registry_for(manager, &self.root),
        }
    }

    /// Names of packages with uncommitted changes or commits since their last tag
    #[instrument(skip(self))]
    pub fn changed_packages(&self) -> Result<Vec<String>> {
        let mut changed = Vec::new();
        for pkg in self.workspace.packages() {
            let config = self.resolver.resolve(&pkg.name, &pkg.path)?;
            if self
                .repo
                .has_changes(&pkg.name, &pkg.path, config.git.tag_prefix.as_deref())?
            {
                changed.push(pkg.name.clone());
            }
        }
        info!(count = changed.len(), packages = ?changed, "detected changed packages");
        Ok(changed)
    }

    /// Release every package with changes since its last tag
    pub fn release_all(&mut self, options: &ReleaseOptions) -> Result<Vec<ReleaseResult>> {
        let names = self.changed_packages()?;
        if names.is_empty() {
            info!("no packages changed since their last release");
        }
        self.release_packages(&names, options)
    }

    /// Release packages one after another, stopping at the first failure
    pub fn release_packages(
        &mut self,
        names: &[String],
        options: &ReleaseOptions,
    ) -> Result<Vec<ReleaseResult>> {
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            results.push(self.release_package(name, options)?);
        }
        info!(count = results.len(), dry_run = options.dry_run, "release batch complete");
        Ok(results)
    }

    /// Release one package.
    ///
    /// Errors are annotated with the package name and the stage that failed.
    #[instrument(skip(self, options), fields(dry_run = options.dry_run))]
    pub fn release_package(&mut self, name: &str, options: &ReleaseOptions) -> Result<ReleaseResult> {
        let mut progress = Progress::new(name);
        match self.run_release(name, options, &mut progress) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(package = name, stage = %progress.stage, error = %e, "release failed");
                Err(LiftoffError::for_package(name, progress.stage, e))
            }
        }
    }

    fn run_release(
        &mut self,
        name: &str,
        options: &ReleaseOptions,
        progress: &mut Progress<'_>,
    ) -> Result<ReleaseResult> {
        progress.enter(ReleaseStage::ConfigResolved);
        let mut pkg = self.workspace.package(name)?.clone();
        let config = self.resolver.resolve(&pkg.name, &pkg.path)?;
        validate_release_config(&config)?;
        let registry = self.registry(config.package_manager);
        let prefix = config.git.tag_prefix.as_deref();

        let publish = config.npm.publish && !pkg.private;
        if config.npm.publish && pkg.private {
            info!(package = %pkg.name, "package is private, publishing disabled");
        }

        progress.enter(ReleaseStage::Validated);
        if options.skip_git_status {
            debug!("git status validation skipped");
        } else {
            self.repo.validate_status(
                &config.git,
                StatusOptions {
                    skip_upstream_tracking: options.skip_upstream_tracking,
                    force: options.force,
                },
            )?;
        }
        if config.check_integrity {
            IntegrityChecker::new(Arc::clone(&registry)).check()?;
        }
        if publish {
            let user = registry.validate_auth(&config.npm)?;
            debug!(user = %user, registry = %config.npm.registry, "registry authentication valid");
        }
        let changelogs = ChangelogEngine::new(&self.repo);
        changelogs.validate(&pkg, &config.changelog, &self.root)?;

        progress.enter(ReleaseStage::VersionDetermined);
        let versions = VersionEngine::new(&self.repo, Arc::clone(&registry));
        let release_type = self.release_type(&pkg, &config, options, &versions)?;
        if let Some(version) = &options.new_version {
            pkg.new_version = Some(version.clone());
        }
        let preid = options
            .preid
            .as_deref()
            .or(config.versioning.prerelease_id.as_deref());
        let version = versions.determine(&pkg, release_type, preid)?;
        versions.validate(&version)?;
        pkg.new_version = Some(version.clone());

        let latest_published = publish.then(|| registry.get_latest_version(&pkg.name, &config.npm));
        if let Some(latest) = &latest_published {
            warn_if_not_newer(&pkg.name, &version, latest);
        }
        info!(
            package = %pkg.name,
            from = %pkg.current_version,
            to = %version,
            release_type = %release_type,
            "determined version"
        );

        progress.enter(ReleaseStage::ChangelogPrepared);
        let changelog_file = ChangelogFile::for_package(&pkg, &config.changelog, &self.root);
        let write_changelog =
            changelog_file.exists() || self.prompter.confirm_changelog_creation(&pkg.name)?;
        let changelog = if write_changelog && config.changelog.conventional_commits {
            changelogs.generate(&pkg, &config)?
        } else {
            String::new()
        };

        progress.enter(ReleaseStage::Confirmed);
        let tag = pkg.tag_name(prefix).unwrap_or_default();
        let plan = ReleasePlan {
            package: pkg.name.clone(),
            current_version: pkg.current_version.clone(),
            new_version: version.clone(),
            release_type,
            changelog: changelog.clone(),
            tag: tag.clone(),
            publish_target: publish.then(|| publish_target(&config.npm)),
            latest_published,
            dry_run: options.dry_run,
        };

        if options.dry_run {
            progress.enter(ReleaseStage::Done);
            info!(plan = %plan, "dry run complete, nothing changed");
            return Ok(ReleaseResult::dry_run(&pkg.name, &version).with_changelog(changelog));
        }
        if !self.prompter.confirm_release(&plan)? {
            return Err(WorkflowError::Cancelled.into());
        }

        progress.enter(ReleaseStage::Applied);
        let hooks = HookRunner::from_config(&config.hooks, &pkg.path);
        let hook_context = HookContext::from_package(&pkg).with_tag(&tag);
        hooks.run(HookStage::PreRelease, &hook_context)?;

        versions.bump(&pkg)?;
        let updates = self.workspace.internal_updates(&pkg);
        versions.update_dependencies(&pkg, &updates)?;
        if write_changelog {
            changelogs.update(&pkg, &changelog, &config.changelog)?;
        }

        progress.enter(ReleaseStage::Tagged);
        let tag = self
            .repo
            .create_tag(&pkg, prefix, &config.git.remote, options.force)?;

        progress.enter(ReleaseStage::Committed);
        let commit = self.repo.commit_changes(&pkg, &config.git.commit_message)?;

        let mut result = ReleaseResult::new(&pkg.name, &version)
            .with_changelog(changelog)
            .with_tag(&tag)
            .with_commit(&commit);

        if config.git.push {
            progress.enter(ReleaseStage::Pushed);
            self.repo.push(&config.git.remote, options.force)?;
        }

        if publish {
            progress.enter(ReleaseStage::Published);
            check_required_files(&pkg, &config.npm)?;
            let artifact = registry.pack(&pkg)?;
            info!(
                package = %pkg.name,
                filename = %artifact.filename,
                files = artifact.files.len(),
                size = artifact.size,
                sha256 = %artifact.sha256,
                "verified package artifact"
            );
            result = result.with_publish(registry.publish(&pkg, &config.npm)?);
        }

        hooks.run(HookStage::PostRelease, &hook_context)?;
        progress.enter(ReleaseStage::Done);

        self.workspace.record_release(&pkg.name, &version);
        info!(package = %pkg.name, version = %version, tag = %tag, commit = %commit, "released");
        Ok(result)
    }

    fn release_type(
        &self,
        pkg: &PackageContext,
        config: &ReleaseConfig,
        options: &ReleaseOptions,
        versions: &VersionEngine<'_>,
    ) -> Result<ReleaseType> {
        if options.new_version.is_some() {
            return Ok(ReleaseType::Custom);
        }
        if let Some(release_type) = options.release_type {
            return Ok(release_type);
        }

        let release_type = match config.versioning.strategy {
            BumpStrategy::Conventional => match config.versioning.bump_type {
                Some(pinned) => pinned,
                None => versions.analyze_commits(pkg, config.git.tag_prefix.as_deref()),
            },
            BumpStrategy::Prompt => self.prompter.get_version_bump(pkg)?,
            BumpStrategy::Patch => ReleaseType::Patch,
        };
        Ok(release_type)
    }
}

fn publish_target(config: &NpmConfig) -> String {
    format!("{} ({})", config.registry, config.tag)
}

fn warn_if_not_newer(package: &str, version: &str, latest: &str) {
    if latest == UNPUBLISHED_VERSION {
        return;
    }
    if let Ok(Ordering::Less | Ordering::Equal) = SemVerStrategy::new().compare(version, latest) {
        warn!(package, version, latest, "new version is not newer than the published one");
    }
}

/// Fail when any configured top-level file is missing from the package
fn check_required_files(pkg: &PackageContext, config: &NpmConfig) -> Result<()> {
    let missing: Vec<&str> = config
        .required_files
        .iter()
        .filter(|file| !pkg.path.join(file).exists())
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(WorkflowError::ValidationFailed(format!(
        "{} is missing required files: {}",
        pkg.name,
        missing.join(", ")
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AutoConfirm;
    use crate::testing::{commit_file, init_repo, MockRegistry};
    use liftoff_core::error::{AdapterError, GitError};
    use tempfile::TempDir;

    const BREAKING: &str = "feat: rework api\n\nBREAKING CHANGE: removed v1 endpoints";

    /// Workspace with one committed package per `(dir, manifest)` pair
    fn fixture(packages: &[(&str, &str)]) -> (TempDir, GitRepo) {
        let (temp, repo) = init_repo();
        commit_file(
            &repo,
            "package.json",
            r#"{"name":"root","private":true,"workspaces":["packages/*"]}"#,
            "chore: workspace",
        );
        for (dir, manifest) in packages {
            commit_file(&repo, &format!("packages/{}/package.json", dir), manifest, "chore: add package");
            commit_file(&repo, &format!("packages/{}/README.md", dir), "# readme\n", "docs: readme");
        }
        (temp, repo)
    }

    fn tag(repo: &GitRepo, name: &str, version: &str) {
        let pkg = PackageContext::new(name, repo.path(), "0.0.0").with_new_version(version);
        repo.create_tag(&pkg, None, "origin", false).unwrap();
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.release.package_manager = PackageManager::Npm;
        config.release.git.push = false;
        config.release.git.allowed_branches = Vec::new();
        config.release.git.require_upstream_tracking = false;
        config
    }

    fn orchestrator(
        temp: &TempDir,
        repo: GitRepo,
        config: Config,
        registry: Arc<MockRegistry>,
        prompter: AutoConfirm,
    ) -> ReleaseOrchestrator {
        let workspace = Workspace::load(temp.path(), &config.workspace).unwrap();
        ReleaseOrchestrator::from_parts(temp.path(), config, workspace, repo, Box::new(prompter))
            .unwrap()
            .with_registry(registry)
    }

    fn pkg1_fixture() -> (TempDir, GitRepo) {
        let (temp, repo) = fixture(&[("pkg1", r#"{"name":"pkg1","version":"1.0.0"}"#)]);
        tag(&repo, "pkg1", "1.0.0");
        commit_file(&repo, "packages/pkg1/index.js", "module.exports = 2;\n", BREAKING);
        (temp, repo)
    }

    #[test]
    fn test_dry_run_breaking_change() {
        let (temp, repo) = pkg1_fixture();
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator = orchestrator(&temp, repo, config(), registry.clone(), AutoConfirm::new());

        let result = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run())
            .unwrap();

        assert_eq!(result.version, "2.0.0");
        assert_eq!(result.git.tag, "dry-run");
        assert_eq!(result.git.commit, "dry-run");
        assert!(result.is_dry_run());
        assert!(result.publish.is_none());
        assert_eq!(result.changelog, "- feat: rework api");

        assert!(registry.mutating_calls().is_empty());
        assert!(!orchestrator.repo().tag_exists("pkg1@2.0.0").unwrap());
        assert!(!temp.path().join("packages/pkg1/CHANGELOG.md").exists());
        assert!(orchestrator.repo().is_clean().unwrap());
        assert_eq!(orchestrator.workspace().package("pkg1").unwrap().current_version, "1.0.0");
    }

    #[test]
    fn test_release_tags_commits_and_publishes() {
        let (temp, repo) = pkg1_fixture();
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator = orchestrator(&temp, repo, config(), registry.clone(), AutoConfirm::new());

        let result = orchestrator
            .release_package("pkg1", &ReleaseOptions::default())
            .unwrap();

        assert_eq!(result.version, "2.0.0");
        assert_eq!(result.git.tag, "pkg1@2.0.0");
        assert_eq!(
            result.publish.as_ref().map(|p| (p.published, p.registry.as_str())),
            Some((true, "https://registry.npmjs.org/"))
        );
        assert_eq!(
            registry.mutating_calls(),
            vec!["set_version pkg1 2.0.0", "pack pkg1", "publish pkg1 2.0.0"]
        );

        let repo = orchestrator.repo();
        assert_eq!(repo.tag_message("pkg1@2.0.0").unwrap().as_deref(), Some("Release pkg1@2.0.0"));
        assert!(repo.is_clean().unwrap());
        let head = repo.head_commit().unwrap();
        assert_eq!(head.summary(), Some("chore(release): release pkg1@2.0.0"));
        assert_eq!(head.id().to_string(), result.git.commit);

        let changelog = std::fs::read_to_string(temp.path().join("packages/pkg1/CHANGELOG.md")).unwrap();
        assert!(changelog.contains("## [2.0.0] - "));
        assert!(changelog.contains("- feat: rework api"));
        assert_eq!(orchestrator.workspace().package("pkg1").unwrap().current_version, "2.0.0");
    }

    #[test]
    fn test_custom_version_and_pinned_strategy() {
        let (temp, repo) = pkg1_fixture();
        let mut config = config();
        config.release.versioning.strategy = BumpStrategy::Patch;
        let mut orchestrator =
            orchestrator(&temp, repo, config, Arc::new(MockRegistry::default()), AutoConfirm::new());

        let patch = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run())
            .unwrap();
        assert_eq!(patch.version, "1.0.1");

        let custom = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run().with_version("1.5.0"))
            .unwrap();
        assert_eq!(custom.version, "1.5.0");

        let pre = orchestrator
            .release_package(
                "pkg1",
                &ReleaseOptions::dry_run()
                    .with_release_type(ReleaseType::Premajor)
                    .with_preid("rc"),
            )
            .unwrap();
        assert_eq!(pre.version, "2.0.0-rc.0");
    }

    #[test]
    fn test_declined_release_is_cancelled() {
        let (temp, repo) = pkg1_fixture();
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator =
            orchestrator(&temp, repo, config(), registry.clone(), AutoConfirm::declining());

        let err = orchestrator
            .release_package("pkg1", &ReleaseOptions::default())
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(matches!(
            err,
            LiftoffError::Package { ref package, stage: ReleaseStage::Confirmed, .. } if package == "pkg1"
        ));
        assert!(registry.mutating_calls().is_empty());
        assert!(!orchestrator.repo().tag_exists("pkg1@2.0.0").unwrap());
    }

    #[test]
    fn test_dirty_tree_fails_validation() {
        let (temp, repo) = pkg1_fixture();
        std::fs::write(temp.path().join("packages/pkg1/wip.js"), "// wip\n").unwrap();
        let mut orchestrator =
            orchestrator(&temp, repo, config(), Arc::new(MockRegistry::default()), AutoConfirm::new());

        let err = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run())
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            LiftoffError::Git(GitError::DirtyWorkingDirectory { files }) if files == &vec!["packages/pkg1/wip.js".to_string()]
        ));

        // Skipping the status check lets the dry run through
        let result = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run().skip_git_status())
            .unwrap();
        assert_eq!(result.version, "2.0.0");
    }

    #[test]
    fn test_existing_tag_requires_force() {
        let (temp, repo) = pkg1_fixture();
        tag(&repo, "pkg1", "2.0.0");
        let mut orchestrator =
            orchestrator(&temp, repo, config(), Arc::new(MockRegistry::default()), AutoConfirm::new());

        let err = orchestrator
            .release_package("pkg1", &ReleaseOptions::default().with_version("2.0.0"))
            .unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Package { stage: ReleaseStage::Tagged, .. }
        ));
        assert!(matches!(err.root_cause(), LiftoffError::Git(GitError::TagExists { .. })));
    }

    #[test]
    fn test_missing_required_file_blocks_publish() {
        let (temp, repo) = pkg1_fixture();
        let mut config = config();
        config.release.npm.required_files.push("LICENSE".to_string());
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator = orchestrator(&temp, repo, config, registry.clone(), AutoConfirm::new());

        let err = orchestrator
            .release_package("pkg1", &ReleaseOptions::default())
            .unwrap_err();
        assert!(matches!(err, LiftoffError::Package { stage: ReleaseStage::Published, .. }));
        assert!(err.to_string().contains("LICENSE"));

        // No rollback: tag and commit stay
        assert!(orchestrator.repo().tag_exists("pkg1@2.0.0").unwrap());
        assert_eq!(registry.mutating_calls(), vec!["set_version pkg1 2.0.0"]);
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let (temp, repo) = fixture(&[
            ("pkg1", r#"{"name":"pkg1","version":"1.0.0"}"#),
            ("pkg2", r#"{"name":"pkg2","version":"3.1.0"}"#),
        ]);
        let registry = Arc::new(MockRegistry::failing("publish"));
        let mut orchestrator = orchestrator(&temp, repo, config(), registry.clone(), AutoConfirm::new());

        let names = vec!["pkg1".to_string(), "pkg2".to_string()];
        let err = orchestrator
            .release_packages(&names, &ReleaseOptions::default())
            .unwrap_err();

        assert!(matches!(
            err,
            LiftoffError::Package { ref package, stage: ReleaseStage::Published, .. } if package == "pkg1"
        ));
        assert!(matches!(
            err.root_cause(),
            LiftoffError::Adapter(AdapterError::CommandFailed { .. })
        ));
        assert!(registry.calls().iter().all(|c| !c.contains("pkg2")));
    }

    #[test]
    fn test_release_all_uses_changed_packages() {
        let (temp, repo) = fixture(&[
            ("pkg1", r#"{"name":"pkg1","version":"1.0.0"}"#),
            ("pkg2", r#"{"name":"pkg2","version":"3.1.0"}"#),
        ]);
        tag(&repo, "pkg1", "1.0.0");
        tag(&repo, "pkg2", "3.1.0");
        commit_file(&repo, "packages/pkg2/index.js", "export {}\n", "fix: empty export");

        let mut orchestrator =
            orchestrator(&temp, repo, config(), Arc::new(MockRegistry::default()), AutoConfirm::new());
        assert_eq!(orchestrator.changed_packages().unwrap(), vec!["pkg2"]);

        let results = orchestrator.release_all(&ReleaseOptions::dry_run()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].package_name, "pkg2");
        assert_eq!(results[0].version, "3.1.1");
    }

    #[test]
    fn test_batch_pins_internal_dependency() {
        let (temp, repo) = fixture(&[
            ("core", r#"{"name":"@acme/core","version":"1.0.0"}"#),
            (
                "app",
                r#"{"name":"@acme/app","version":"0.4.0","dependencies":{"@acme/core":"^1.0.0","left-pad":"^1.3.0"}}"#,
            ),
        ]);
        let mut config = config();
        config.release.npm.publish = false;
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator = orchestrator(&temp, repo, config, registry.clone(), AutoConfirm::new());

        let names = vec!["@acme/core".to_string(), "@acme/app".to_string()];
        let options = ReleaseOptions::default().with_release_type(ReleaseType::Minor);
        let results = orchestrator.release_packages(&names, &options).unwrap();

        assert_eq!(results[0].version, "1.1.0");
        assert_eq!(results[1].version, "0.5.0");
        assert!(results.iter().all(|r| r.publish.is_none()));
        assert_eq!(
            registry.mutating_calls(),
            vec![
                "set_version @acme/core 1.1.0",
                "set_version @acme/app 0.5.0",
                "update_dependencies @acme/app @acme/core",
            ]
        );

        let manifest =
            std::fs::read_to_string(temp.path().join("packages/app/package.json")).unwrap();
        assert!(manifest.contains(r#""@acme/core": "^1.1.0""#));
        assert!(manifest.contains(r#""left-pad": "^1.3.0""#));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_pre_release_hook_stops_before_changes() {
        let (temp, repo) = pkg1_fixture();
        let mut config = config();
        config.release.hooks.pre_release = vec!["echo lint failed >&2; exit 1".to_string()];
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator = orchestrator(&temp, repo, config, registry.clone(), AutoConfirm::new());

        let err = orchestrator
            .release_package("pkg1", &ReleaseOptions::default())
            .unwrap_err();
        assert!(matches!(err, LiftoffError::Package { stage: ReleaseStage::Applied, .. }));
        assert!(err.to_string().contains("lint failed"));
        assert!(registry.mutating_calls().is_empty());
        assert!(!orchestrator.repo().tag_exists("pkg1@2.0.0").unwrap());
    }

    #[test]
    fn test_prompt_strategy_asks_for_bump() {
        let (temp, repo) = pkg1_fixture();
        let mut config = config();
        config.release.versioning.strategy = BumpStrategy::Prompt;
        let prompter = AutoConfirm::new().with_bump(ReleaseType::Minor);
        let mut orchestrator =
            orchestrator(&temp, repo, config, Arc::new(MockRegistry::default()), prompter);

        // The breaking commit would imply major; the prompter's answer wins
        let result = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run())
            .unwrap();
        assert_eq!(result.version, "1.1.0");
        assert!(result.is_dry_run());
    }

    #[test]
    fn test_conventional_strategy_with_pinned_bump() {
        let (temp, repo) = pkg1_fixture();
        let mut config = config();
        config.release.versioning.strategy = BumpStrategy::Conventional;
        config.release.versioning.bump_type = Some(ReleaseType::Patch);
        let mut orchestrator =
            orchestrator(&temp, repo, config, Arc::new(MockRegistry::default()), AutoConfirm::new());

        let result = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run())
            .unwrap();
        assert_eq!(result.version, "1.0.1");
        assert_eq!(result.changelog, "- feat: rework api");
    }

    #[test]
    fn test_declined_changelog_creation() {
        let (temp, repo) = pkg1_fixture();
        let registry = Arc::new(MockRegistry::default());
        let prompter = AutoConfirm::new().with_changelog_creation(false);
        let mut orchestrator = orchestrator(&temp, repo, config(), registry.clone(), prompter);
        let changelog_path = temp.path().join("packages/pkg1/CHANGELOG.md");

        let dry = orchestrator
            .release_package("pkg1", &ReleaseOptions::dry_run())
            .unwrap();
        assert_eq!(dry.version, "2.0.0");
        assert!(dry.changelog.is_empty());
        assert!(!changelog_path.exists());

        let result = orchestrator
            .release_package("pkg1", &ReleaseOptions::default())
            .unwrap();
        assert!(result.changelog.is_empty());
        assert_eq!(result.git.tag, "pkg1@2.0.0");
        assert!(!changelog_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_post_release_hook_keeps_last_stage() {
        let (temp, repo) = pkg1_fixture();
        let mut config = config();
        config.release.npm.publish = false;
        config.release.hooks.post_release = vec!["echo notify failed >&2; exit 1".to_string()];
        let registry = Arc::new(MockRegistry::default());
        let mut orchestrator = orchestrator(&temp, repo, config, registry.clone(), AutoConfirm::new());

        let err = orchestrator
            .release_package("pkg1", &ReleaseOptions::default())
            .unwrap_err();
        assert!(matches!(err, LiftoffError::Package { stage: ReleaseStage::Committed, .. }));
        assert!(err.to_string().contains("notify failed"));
        assert!(orchestrator.repo().tag_exists("pkg1@2.0.0").unwrap());
        assert_eq!(registry.mutating_calls(), vec!["set_version pkg1 2.0.0"]);
    }

    #[test]
    fn test_unknown_package() {
        let (temp, repo) = pkg1_fixture();
        let mut orchestrator =
            orchestrator(&temp, repo, config(), Arc::new(MockRegistry::default()), AutoConfirm::new());

        let err = orchestrator
            .release_package("missing", &ReleaseOptions::dry_run())
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            LiftoffError::Workflow(WorkflowError::PackageNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_required_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();
        let pkg = PackageContext::new("pkg1", temp.path(), "1.0.0");

        let err = check_required_files(&pkg, &NpmConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: pkg1 is missing required files: README.md"
        );

        std::fs::write(temp.path().join("README.md"), "# pkg1\n").unwrap();
        assert!(check_required_files(&pkg, &NpmConfig::default()).is_ok());
    }
}
