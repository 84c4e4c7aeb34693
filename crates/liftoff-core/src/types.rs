//! Core types for Liftoff

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Marker used for tag and commit identifiers of a dry run
pub const DRY_RUN_MARKER: &str = "dry-run";

/// Type of release being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// Major version bump (breaking changes)
    Major,
    /// Minor version bump (new features)
    Minor,
    /// Patch version bump (bug fixes)
    Patch,
    /// Next major as a pre-release
    Premajor,
    /// Next minor as a pre-release
    Preminor,
    /// Next patch as a pre-release
    Prepatch,
    /// Increment the pre-release counter
    Prerelease,
    /// Explicit version chosen by the caller
    Custom,
}

impl ReleaseType {
    /// Returns the string representation of the release type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Premajor => "premajor",
            Self::Preminor => "preminor",
            Self::Prepatch => "prepatch",
            Self::Prerelease => "prerelease",
            Self::Custom => "custom",
        }
    }

    /// Whether this release type produces a pre-release version
    pub fn is_prerelease(&self) -> bool {
        matches!(
            self,
            Self::Premajor | Self::Preminor | Self::Prepatch | Self::Prerelease
        )
    }

    /// Get the higher-precedence of two bump types
    pub fn max(self, other: Self) -> Self {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Patch | Self::Prepatch | Self::Prerelease => 1,
            Self::Minor | Self::Preminor => 2,
            Self::Major | Self::Premajor => 3,
            Self::Custom => 4,
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "premajor" => Ok(Self::Premajor),
            "preminor" => Ok(Self::Preminor),
            "prepatch" => Ok(Self::Prepatch),
            "prerelease" | "pre" => Ok(Self::Prerelease),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown release type: {}", s)),
        }
    }
}

/// States a package moves through during one release attempt.
///
/// A failed release is annotated with the stage it was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStage {
    Idle,
    ConfigResolved,
    Validated,
    VersionDetermined,
    ChangelogPrepared,
    Confirmed,
    Applied,
    Tagged,
    Committed,
    Pushed,
    Published,
    Done,
    Failed,
}

impl ReleaseStage {
    /// Returns the string representation of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ConfigResolved => "config resolution",
            Self::Validated => "validation",
            Self::VersionDetermined => "version determination",
            Self::ChangelogPrepared => "changelog preparation",
            Self::Confirmed => "confirmation",
            Self::Applied => "applying changes",
            Self::Tagged => "tagging",
            Self::Committed => "commit",
            Self::Pushed => "push",
            Self::Published => "publish",
            Self::Done => "completion",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A workspace package as seen by a release attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageContext {
    /// Package name, unique within the workspace
    pub name: String,
    /// Absolute package directory
    pub path: PathBuf,
    /// Version currently in the manifest
    pub current_version: String,
    /// Version chosen for this release attempt
    pub new_version: Option<String>,
    /// Whether the manifest marks the package private
    pub private: bool,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PackageContext {
    /// Create a context with no dependencies
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            current_version: current_version.into(),
            new_version: None,
            private: false,
            dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            peer_dependencies: BTreeMap::new(),
        }
    }

    /// Set the new version
    pub fn with_new_version(mut self, version: impl Into<String>) -> Self {
        self.new_version = Some(version.into());
        self
    }

    /// Add a runtime dependency
    pub fn with_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), range.into());
        self
    }

    /// Add a development dependency
    pub fn with_dev_dependency(
        mut self,
        name: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        self.dev_dependencies.insert(name.into(), range.into());
        self
    }

    /// Add a peer dependency
    pub fn with_peer_dependency(
        mut self,
        name: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        self.peer_dependencies.insert(name.into(), range.into());
        self
    }

    /// Names across all three dependency sections
    pub fn all_dependency_names(&self) -> impl Iterator<Item = &String> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
    }

    /// Tag name for the new version, if one is set
    pub fn tag_name(&self, prefix: Option<&str>) -> Option<String> {
        self.new_version
            .as_ref()
            .map(|v| format!("{}{}@{}", prefix.unwrap_or(""), self.name, v))
    }
}

/// Version-control identifiers produced by a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitOutcome {
    pub tag: String,
    pub commit: String,
}

/// Outcome of a registry publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub published: bool,
    pub registry: String,
}

/// Result of a release operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseResult {
    /// The package name
    pub package_name: String,
    /// Released version
    pub version: String,
    /// Changelog content generated
    pub changelog: String,
    /// Tag and commit created
    pub git: GitOutcome,
    /// Registry outcome, when publishing was enabled
    pub publish: Option<PublishOutcome>,
}

impl ReleaseResult {
    /// Create a new release result
    pub fn new(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            changelog: String::new(),
            git: GitOutcome {
                tag: String::new(),
                commit: String::new(),
            },
            publish: None,
        }
    }

    /// Synthetic result for a dry run
    pub fn dry_run(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(package_name, version)
            .with_tag(DRY_RUN_MARKER)
            .with_commit(DRY_RUN_MARKER)
    }

    /// Set the changelog
    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = changelog.into();
        self
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.git.tag = tag.into();
        self
    }

    /// Set the commit
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.git.commit = commit.into();
        self
    }

    /// Set the publish outcome
    pub fn with_publish(mut self, outcome: PublishOutcome) -> Self {
        self.publish = Some(outcome);
        self
    }

    /// Whether this result came from a dry run
    pub fn is_dry_run(&self) -> bool {
        self.git.tag == DRY_RUN_MARKER && self.git.commit == DRY_RUN_MARKER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_release_type_from_str() {
        assert_eq!(ReleaseType::from_str("major").unwrap(), ReleaseType::Major);
        assert_eq!(ReleaseType::from_str("MINOR").unwrap(), ReleaseType::Minor);
        assert_eq!(
            ReleaseType::from_str("preminor").unwrap(),
            ReleaseType::Preminor
        );
        assert!(ReleaseType::from_str("invalid").is_err());
    }

    #[test]
    fn test_release_type_max() {
        assert_eq!(ReleaseType::Patch.max(ReleaseType::Minor), ReleaseType::Minor);
        assert_eq!(ReleaseType::Major.max(ReleaseType::Minor), ReleaseType::Major);
        assert!(ReleaseType::Prepatch.is_prerelease());
        assert!(!ReleaseType::Custom.is_prerelease());
    }

    #[test]
    fn test_tag_name() {
        let pkg = PackageContext::new("pkg1", "/repo/packages/pkg1", "1.0.0");
        assert_eq!(pkg.tag_name(None), None);

        let pkg = pkg.with_new_version("2.0.0");
        assert_eq!(pkg.tag_name(None).as_deref(), Some("pkg1@2.0.0"));
        assert_eq!(pkg.tag_name(Some("v/")).as_deref(), Some("v/pkg1@2.0.0"));
    }

    #[test]
    fn test_release_result_builder() {
        let result = ReleaseResult::new("my-package", "1.0.0")
            .with_changelog("- fix")
            .with_tag("my-package@1.0.0")
            .with_commit("abc123")
            .with_publish(PublishOutcome {
                published: true,
                registry: "https://registry.npmjs.org/".to_string(),
            });

        assert_eq!(result.package_name, "my-package");
        assert_eq!(result.git.tag, "my-package@1.0.0");
        assert!(result.publish.as_ref().is_some_and(|p| p.published));
        assert!(!result.is_dry_run());
        assert!(ReleaseResult::dry_run("my-package", "1.0.0").is_dry_run());
    }
}
