//! Error types for Liftoff

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ReleaseStage;

/// Result type alias using LiftoffError
pub type Result<T> = std::result::Result<T, LiftoffError>;

/// Main error type for Liftoff operations
#[derive(Debug, Error)]
pub enum LiftoffError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// Adapter-related errors
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Workflow-related errors
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A failure while releasing one package
    #[error("Release of {package} failed during {stage}: {source}")]
    Package {
        package: String,
        stage: ReleaseStage,
        #[source]
        source: Box<LiftoffError>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Invalid package pattern
    #[error("Invalid package pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Working directory is not clean
    #[error("Working directory is not clean. Changed files:\n{}", .files.join("\n"))]
    DirtyWorkingDirectory { files: Vec<String> },

    /// Local branch trails its upstream
    #[error("Branch {branch} is behind {upstream} by {count} commit(s). Pull the latest changes or rerun with force")]
    BehindRemote {
        branch: String,
        upstream: String,
        count: usize,
    },

    /// Upstream tracking is required but missing
    #[error("Branch {branch} has no upstream tracking branch. Run `git push --set-upstream {remote} {branch}`")]
    NoUpstream { branch: String, remote: String },

    /// Current branch is not in the allow-list
    #[error("Releases are not allowed from branch {branch} (allowed: {})", .allowed.join(", "))]
    BranchNotAllowed { branch: String, allowed: Vec<String> },

    /// Tag already exists
    #[error("Tag {tag} already exists. Remove it with `git tag -d {tag}` (and `git push {remote} :refs/tags/{tag}` if it was pushed) or rerun with force")]
    TagExists { tag: String, remote: String },

    /// Tag or commit requested before a version was determined
    #[error("No new version set for {package}")]
    VersionRequired { package: String },

    /// Push rejected by the remote
    #[error("Push to {remote}/{branch} was rejected: {reason}\nTo overwrite the remote, run: {command}")]
    PushRejected {
        remote: String,
        branch: String,
        reason: String,
        command: String,
    },

    /// External git command failed
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// HEAD is detached or unborn
    #[error("Cannot determine current branch: {0}")]
    NoBranch(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Caller supplied an incomplete request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Version string violates semver
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Package manager failed to apply the version
    #[error("Failed to bump version of {package}: {reason}")]
    BumpFailed { package: String, reason: String },
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Changelog missing or malformed
    #[error("Invalid changelog {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter-related errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Package manifest not found
    #[error("Package manifest not found at {0}")]
    ManifestNotFound(PathBuf),

    /// Failed to parse manifest
    #[error("Failed to parse manifest: {0}")]
    ManifestParseError(String),

    /// Failed to update manifest
    #[error("Failed to update manifest: {0}")]
    ManifestUpdateError(String),

    /// Publish failed
    #[error("Failed to publish package: {0}")]
    PublishFailed(String),

    /// Authentication failed
    #[error("Authentication failed for registry {registry}: {reason}\n{remediation}")]
    AuthenticationFailed {
        registry: String,
        reason: String,
        remediation: String,
    },

    /// Package script failed
    #[error("Script '{script}' failed: {reason}")]
    ScriptFailed { script: String, reason: String },

    /// Packed artifact could not be read
    #[error("Invalid package archive {path}: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    /// Command execution failed
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Workflow-related errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Installed dependencies do not match manifests
    #[error("Workspace integrity check failed: installing would change the lockfile. {remediation}")]
    IntegrityCheckFailed { remediation: String },

    /// Lifecycle hook failed
    #[error("{stage} hook '{command}' failed: {reason}")]
    HookFailed {
        stage: String,
        command: String,
        reason: String,
    },

    /// Package not part of the workspace
    #[error("Package not found in workspace: {0}")]
    PackageNotFound(String),

    /// User cancelled
    #[error("Release cancelled by user")]
    Cancelled,
}

impl LiftoffError {
    /// Annotate an error with the package and stage it occurred in
    pub fn for_package(package: impl Into<String>, stage: ReleaseStage, source: LiftoffError) -> Self {
        Self::Package {
            package: package.into(),
            stage,
            source: Box::new(source),
        }
    }

    /// The underlying error with any package annotation removed
    pub fn root_cause(&self) -> &LiftoffError {
        match self {
            Self::Package { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the release was declined at the confirmation gate
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.root_cause(),
            LiftoffError::Workflow(WorkflowError::Cancelled)
        )
    }
}
