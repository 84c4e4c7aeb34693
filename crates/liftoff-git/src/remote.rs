//! Remote operations
//!
//! Network operations shell out to the git CLI so that credential helpers,
//! SSH agents and proxy settings behave as they do for the user.

use tracing::{info, instrument, warn};

use liftoff_core::error::GitError;

use crate::repository::{GitRepo, Result};

/// Arguments for pushing `branch` with its annotated tags
pub(crate) fn push_args(remote: &str, branch: &str, set_upstream: bool, force: bool) -> Vec<String> {
    let mut args = vec!["push".to_string(), "--follow-tags".to_string()];
    if force {
        args.push("--force".to_string());
    }
    if set_upstream {
        args.push("--set-upstream".to_string());
    }
    args.push(remote.to_string());
    args.push(branch.to_string());
    args
}

/// Whether git's stderr describes a rejected (non-fast-forward) push
pub(crate) fn is_rejection(stderr: &str) -> bool {
    stderr.contains("[rejected]")
        || stderr.contains("non-fast-forward")
        || stderr.contains("fetch first")
        || stderr.contains("Updates were rejected")
}

impl GitRepo {
    /// Fetch from a remote
    #[instrument(skip(self))]
    pub fn fetch(&self, remote: &str) -> Result<()> {
        let start = std::time::Instant::now();
        self.git_cli(&["fetch", remote])?;
        info!(
            remote,
            duration_ms = start.elapsed().as_millis(),
            "fetched from remote"
        );
        Ok(())
    }

    /// Push the current branch with tags, setting upstream when untracked
    #[instrument(skip(self))]
    pub fn push(&self, remote: &str, force: bool) -> Result<()> {
        let start = std::time::Instant::now();
        let branch = self
            .current_branch()?
            .ok_or_else(|| GitError::NoBranch("HEAD is detached or unborn".to_string()))?;
        let set_upstream = self.upstream(&branch)?.is_none();

        let args = push_args(remote, &branch, set_upstream, force);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        match self.git_cli(&arg_refs) {
            Ok(_) => {
                info!(
                    remote,
                    branch = %branch,
                    set_upstream,
                    duration_ms = start.elapsed().as_millis(),
                    "pushed branch with tags"
                );
                Ok(())
            }
            Err(GitError::CommandFailed { reason, .. }) if is_rejection(&reason) => {
                warn!(remote, branch = %branch, "push rejected");
                Err(GitError::PushRejected {
                    command: push_args(remote, &branch, set_upstream, true)
                        .iter()
                        .fold("git".to_string(), |cmd, arg| format!("{} {}", cmd, arg)),
                    remote: remote.to_string(),
                    branch,
                    reason,
                })
            }
            Err(e) => Err(e),
        }
    }
}
