//! Git types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit read from history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitCommit {
    /// Commit hash (full)
    pub hash: String,
    /// Short hash (first 7 characters)
    pub short_hash: String,
    /// Commit timestamp
    pub date: DateTime<Utc>,
    /// Commit message (first line)
    pub message: String,
    /// Remainder of the message after the summary
    pub body: Option<String>,
    /// Paths changed by this commit, relative to the repository root
    pub files: Vec<String>,
}

impl GitCommit {
    /// Create a new GitCommit
    pub fn new(hash: impl Into<String>, message: impl Into<String>, date: DateTime<Utc>) -> Self {
        let hash = hash.into();
        let short_hash = hash.chars().take(7).collect();

        Self {
            hash,
            short_hash,
            date,
            message: message.into(),
            body: None,
            files: Vec::new(),
        }
    }

    /// Set the commit body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the changed files
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Get the full message including body
    pub fn full_message(&self) -> String {
        match &self.body {
            Some(body) => format!("{}\n\n{}", self.message, body),
            None => self.message.clone(),
        }
    }

    /// Whether any changed file lies under `dir` (repository-relative)
    pub fn touches(&self, dir: &str) -> bool {
        self.files.iter().any(|f| is_under(f, dir))
    }
}

/// Options for [`crate::GitRepo::validate_status`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusOptions {
    /// Accept a branch without upstream tracking
    pub skip_upstream_tracking: bool,
    /// Ignore behind-remote and branch allow-list failures
    pub force: bool,
}

/// Whether a repository-relative `path` lies under the directory `dir`.
///
/// An empty `dir` is the repository root and contains everything.
pub fn is_under(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    dir.is_empty()
        || path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}
