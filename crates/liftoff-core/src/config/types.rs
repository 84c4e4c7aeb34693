//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::hooks::HooksConfig;
use crate::types::ReleaseType;

/// Root configuration for a workspace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings applied to every package unless overridden
    #[serde(flatten)]
    pub release: ReleaseConfig,

    /// Workspace-wide settings
    pub workspace: WorkspaceConfig,

    /// Ordered package-pattern overrides, first match wins
    pub packages: Vec<PackageOverride>,
}

/// Effective configuration for one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Package manager driving registry operations
    pub package_manager: PackageManager,

    /// Git configuration
    pub git: GitConfig,

    /// Registry configuration
    pub npm: NpmConfig,

    /// Changelog configuration
    pub changelog: ChangelogConfig,

    /// Versioning configuration
    pub versioning: VersioningConfig,

    /// Lifecycle hooks
    pub hooks: HooksConfig,

    /// Verify the lockfile before releasing
    pub check_integrity: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            package_manager: PackageManager::default(),
            git: GitConfig::default(),
            npm: NpmConfig::default(),
            changelog: ChangelogConfig::default(),
            versioning: VersioningConfig::default(),
            hooks: HooksConfig::default(),
            check_integrity: false,
        }
    }
}

/// Supported package-manager ecosystems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    #[default]
    Yarn,
}

impl PackageManager {
    /// Executable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Git configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Remote name
    pub remote: String,

    /// Branches releases may run from; empty allows any
    pub allowed_branches: Vec<String>,

    /// Whether to require clean working directory
    pub require_clean_working_directory: bool,

    /// Whether the branch must track an upstream
    pub require_upstream_tracking: bool,

    /// Commit message template with `${packageName}` and `${version}`
    pub commit_message: String,

    /// Prefix prepended to `{packageName}@{version}` tags
    pub tag_prefix: Option<String>,

    /// Whether to push after committing
    pub push: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            allowed_branches: vec!["main".to_string(), "master".to_string()],
            require_clean_working_directory: true,
            require_upstream_tracking: true,
            commit_message: "chore(release): release ${packageName}@${version}".to_string(),
            tag_prefix: None,
            push: true,
        }
    }
}

/// Registry access level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAccess {
    #[default]
    Public,
    Restricted,
}

impl PublishAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpmConfig {
    /// Whether to publish to the registry
    pub publish: bool,

    /// Registry URL
    pub registry: String,

    /// Distribution tag
    pub tag: String,

    /// Access level for scoped packages
    pub access: PublishAccess,

    /// One-time password for 2FA
    pub otp: Option<String>,

    /// Files that must exist in the package directory before publishing
    pub required_files: Vec<String>,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            publish: true,
            registry: "https://registry.npmjs.org/".to_string(),
            tag: "latest".to_string(),
            access: PublishAccess::Public,
            otp: None,
            required_files: vec!["package.json".to_string(), "README.md".to_string()],
        }
    }
}

/// Changelog file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangelogFormat {
    /// Flat `- message` list
    #[default]
    Conventional,
    /// Added/Changed/Deprecated/Removed/Fixed/Security sections
    KeepAChangelog,
}

/// Changelog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Changelog format
    pub format: ChangelogFormat,

    /// Changelog file path, relative to the package directory
    pub file: PathBuf,

    /// Fail validation when the file is missing
    pub required: bool,

    /// Regenerate entries from conventional commits
    pub conventional_commits: bool,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            format: ChangelogFormat::Conventional,
            file: PathBuf::from("CHANGELOG.md"),
            required: false,
            conventional_commits: true,
        }
    }
}

/// How the next version is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpStrategy {
    /// Infer from commit messages
    #[default]
    Conventional,
    /// Ask the prompter
    Prompt,
    /// Always patch
    Patch,
}

/// Versioning configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Bump strategy
    pub strategy: BumpStrategy,

    /// Pins the bump type chosen by the conventional strategy
    pub bump_type: Option<ReleaseType>,

    /// Pre-release identifier
    pub prerelease_id: Option<String>,
}

/// Workspace-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Scope prefixes marking workspace-internal dependencies (e.g. `@acme/`)
    pub internal_scopes: Vec<String>,
}

/// Partial configuration applied to packages whose name matches `pattern`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageOverride {
    /// Glob matched against the package name
    pub pattern: String,

    /// Partial release configuration
    #[serde(flatten)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}
