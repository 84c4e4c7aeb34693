//! Fixtures shared by the orchestrator tests

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use git2::{Repository, Signature};
use tempfile::TempDir;

use liftoff_adapters::{PackageArchiveInfo, PackageRegistry};
use liftoff_core::config::{NpmConfig, PackageManager};
use liftoff_core::error::{AdapterError, Result};
use liftoff_core::types::{PackageContext, PublishOutcome};
use liftoff_git::GitRepo;

/// Repository with one commit containing `README.md`
pub fn init_repo() -> (TempDir, GitRepo) {
    let temp = TempDir::new().unwrap();
    Repository::init(temp.path()).unwrap();
    let repo = GitRepo::open(temp.path()).unwrap();
    commit_file(&repo, "README.md", "# repo\n", "chore: initial commit");
    (temp, repo)
}

/// Write `path` and commit it on HEAD
pub fn commit_file(repo: &GitRepo, path: &str, content: &str, message: &str) -> git2::Oid {
    let inner = repo.inner();
    let full = inner.workdir().unwrap().join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, content).unwrap();

    let mut index = inner.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree = inner.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parent = inner.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    inner
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Registry double recording every call as `operation args...`
#[derive(Default)]
pub struct MockRegistry {
    calls: Mutex<Vec<String>>,
    fail: Option<&'static str>,
    latest: Option<String>,
}

impl MockRegistry {
    /// Registry whose `operation` fails
    pub fn failing(operation: &'static str) -> Self {
        Self {
            fail: Some(operation),
            ..Self::default()
        }
    }

    /// Registry reporting `version` as the latest published
    pub fn with_latest(mut self, version: &str) -> Self {
        self.latest = Some(version.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change the package or the registry
    pub fn mutating_calls(&self) -> Vec<String> {
        const MUTATING: [&str; 5] = ["set_version", "update_dependencies", "pack", "publish", "run_script"];
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.iter().any(|op| c.split(' ').next() == Some(*op)))
            .collect()
    }

    fn record(&self, operation: &str, args: &[&str]) -> Result<()> {
        let mut call = operation.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        self.calls.lock().unwrap().push(call);

        if self.fail == Some(operation) {
            return Err(AdapterError::CommandFailed {
                command: operation.to_string(),
                reason: "simulated failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl PackageRegistry for MockRegistry {
    fn kind(&self) -> PackageManager {
        PackageManager::Npm
    }

    fn validate_auth(&self, config: &NpmConfig) -> Result<String> {
        self.record("validate_auth", &[config.registry.as_str()])?;
        Ok("tester".to_string())
    }

    fn publish(&self, pkg: &PackageContext, config: &NpmConfig) -> Result<PublishOutcome> {
        self.record("publish", &[pkg.name.as_str(), pkg.new_version.as_deref().unwrap_or("")])?;
        Ok(PublishOutcome {
            published: true,
            registry: config.registry.clone(),
        })
    }

    fn get_latest_version(&self, name: &str, _config: &NpmConfig) -> String {
        let _ = self.record("get_latest_version", &[name]);
        self.latest.clone().unwrap_or_else(|| "0.0.0".to_string())
    }

    fn check_workspace_integrity(&self) -> bool {
        self.record("check_workspace_integrity", &[]).is_ok()
    }

    fn update_dependencies(&self, pkg: &PackageContext, names: &[String]) -> Result<()> {
        let mut args = vec![pkg.name.as_str()];
        args.extend(names.iter().map(String::as_str));
        self.record("update_dependencies", &args)
    }

    fn set_version(&self, pkg: &PackageContext, version: &str) -> Result<()> {
        self.record("set_version", &[pkg.name.as_str(), version])?;
        let path = pkg.path.join("package.json");
        if let Ok(content) = std::fs::read_to_string(&path) {
            let mut manifest = liftoff_adapters::PackageJson::parse(&content)?;
            manifest.set_version(version);
            manifest.save(&path)?;
        }
        Ok(())
    }

    fn pack(&self, pkg: &PackageContext) -> Result<PackageArchiveInfo> {
        self.record("pack", &[pkg.name.as_str()])?;
        Ok(PackageArchiveInfo {
            filename: format!("{}.tgz", pkg.name),
            path: pkg.path.join(format!("{}.tgz", pkg.name)),
            size: 0,
            unpacked_size: 0,
            files: Vec::new(),
            created_at: Utc::now(),
            sha256: String::new(),
        })
    }

    fn run_script(&self, pkg: &PackageContext, script: &str) -> Result<()> {
        self.record("run_script", &[pkg.name.as_str(), script])
    }
}
