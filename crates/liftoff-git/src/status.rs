//! Repository status operations

use std::path::Path;

use git2::BranchType;
use tracing::{debug, info, instrument, warn};

use liftoff_core::config::GitConfig;
use liftoff_core::error::GitError;

use crate::repository::{GitRepo, Result};
use crate::types::{is_under, StatusOptions};

impl GitRepo {
    /// Paths of every uncommitted change, untracked files included
    pub fn changed_files(&self) -> Result<Vec<String>> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let files = statuses
            .iter()
            .filter(|entry| entry.status() != git2::Status::CURRENT)
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect();

        Ok(files)
    }

    /// Check if the working directory is clean (no uncommitted changes)
    pub fn is_clean(&self) -> Result<bool> {
        Ok(self.changed_files()?.is_empty())
    }

    /// Get the current branch name
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            // Detached HEAD
            Ok(None)
        }
    }

    /// Upstream of a local branch, e.g. `origin/main`
    pub fn upstream(&self, branch: &str) -> Result<Option<String>> {
        let local = self.repo.find_branch(branch, BranchType::Local)?;
        match local.upstream() {
            Ok(upstream) => Ok(upstream.name()?.map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of commits `branch` trails `upstream` by
    pub fn behind_count(&self, branch: &str, upstream: &str) -> Result<usize> {
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)?
            .get()
            .peel_to_commit()?
            .id();
        let remote = self
            .repo
            .find_branch(upstream, BranchType::Remote)?
            .get()
            .peel_to_commit()?
            .id();

        let (_ahead, behind) = self.repo.graph_ahead_behind(local, remote)?;
        Ok(behind)
    }

    /// Check the working copy is in a releasable state
    #[instrument(skip(self, config), fields(remote = %config.remote))]
    pub fn validate_status(&self, config: &GitConfig, options: StatusOptions) -> Result<()> {
        if config.require_clean_working_directory {
            let files = self.changed_files()?;
            if !files.is_empty() {
                warn!(count = files.len(), "working directory is dirty");
                return Err(GitError::DirtyWorkingDirectory { files });
            }
        }

        let branch = self
            .current_branch()?
            .ok_or_else(|| GitError::NoBranch("HEAD is detached or unborn".to_string()))?;

        match self.upstream(&branch)? {
            None if !config.require_upstream_tracking || options.skip_upstream_tracking => {
                debug!(branch = %branch, "branch is untracked, skipping remote checks");
                return Ok(());
            }
            None if !options.force => {
                return Err(GitError::NoUpstream {
                    branch,
                    remote: config.remote.clone(),
                });
            }
            None => warn!(branch = %branch, "branch is untracked, continuing due to force"),
            Some(upstream) => {
                self.fetch(&config.remote)?;
                let behind = self.behind_count(&branch, &upstream)?;
                if behind > 0 {
                    if !options.force {
                        return Err(GitError::BehindRemote {
                            branch,
                            upstream,
                            count: behind,
                        });
                    }
                    warn!(branch = %branch, upstream = %upstream, behind, "branch is behind upstream, continuing due to force");
                }
            }
        }

        if !config.allowed_branches.is_empty() && !config.allowed_branches.contains(&branch) {
            if !options.force {
                return Err(GitError::BranchNotAllowed {
                    branch,
                    allowed: config.allowed_branches.clone(),
                });
            }
            warn!(branch = %branch, "branch not in allow-list, continuing due to force");
        }

        info!(branch = %branch, "git status validated");
        Ok(())
    }

    /// Whether a package has uncommitted changes or commits since its last tag
    #[instrument(skip(self), fields(package = package_name))]
    pub fn has_changes(
        &self,
        package_name: &str,
        package_path: &Path,
        tag_prefix: Option<&str>,
    ) -> Result<bool> {
        let dir = self.relative_path(package_path);

        if self.changed_files()?.iter().any(|f| is_under(f, &dir)) {
            debug!(dir = %dir, "uncommitted changes under package");
            return Ok(true);
        }

        let tag = self.get_last_tag(package_name, tag_prefix)?;
        let changed = self
            .commits_since_tag(&tag)?
            .iter()
            .any(|commit| commit.touches(&dir));

        debug!(dir = %dir, tag = %tag, changed, "checked commits since last tag");
        Ok(changed)
    }
}
