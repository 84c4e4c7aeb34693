//! Git repository operations

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Repository, Signature};
use tracing::{debug, info, instrument, warn};

use liftoff_core::error::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RepositoryNotFound(path.to_path_buf())
            } else {
                GitError::Git2(e)
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            repo,
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let repo = Repository::discover(start_path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RepositoryNotFound(start_path.to_path_buf())
            } else {
                GitError::Git2(e)
            }
        })?;

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the inner git2 Repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Get the HEAD commit
    pub fn head_commit(&self) -> Result<git2::Commit<'_>> {
        let head = self.repo.head()?;
        head.peel_to_commit().map_err(GitError::Git2)
    }

    /// Path of `path` relative to the working directory, with `/` separators.
    ///
    /// Paths outside the working directory are returned unchanged.
    pub fn relative_path(&self, path: &Path) -> String {
        let workdir = self.repo.workdir().unwrap_or(&self.path);
        let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
        let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let relative = target
            .strip_prefix(&workdir)
            .or_else(|_| path.strip_prefix(self.repo.workdir().unwrap_or(&self.path)))
            .unwrap_or(path);

        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Signature for tags and commits, falling back when git has no identity configured
    pub(crate) fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(e) => {
                warn!(error = %e, "no git identity configured, using default signature");
                Ok(Signature::now("liftoff", "liftoff@localhost")?)
            }
        }
    }

    /// Run the git CLI in the repository, returning stdout.
    ///
    /// The CLI is used for network operations so the user's credential
    /// helpers and SSH agent apply.
    pub(crate) fn git_cli(&self, args: &[&str]) -> Result<String> {
        let start = std::time::Instant::now();
        let command = format!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            command = %command,
            duration_ms = start.elapsed().as_millis(),
            success = output.status.success(),
            "git (CLI)"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::CommandFailed {
                command,
                reason: stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
