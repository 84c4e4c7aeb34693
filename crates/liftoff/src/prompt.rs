//! Decisions delegated to the embedding application

use serde::Serialize;
use tracing::info;

use liftoff_core::error::Result;
use liftoff_core::types::{PackageContext, ReleaseType};

/// What a release is about to do, shown before confirmation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleasePlan {
    pub package: String,
    pub current_version: String,
    pub new_version: String,
    pub release_type: ReleaseType,
    /// Changelog text that will be written
    pub changelog: String,
    pub tag: String,
    /// Registry and dist-tag, when publishing
    pub publish_target: Option<String>,
    /// Version currently on the registry
    pub latest_published: Option<String>,
    pub dry_run: bool,
}

impl std::fmt::Display for ReleasePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} -> {} ({}), tag {}",
            self.package, self.current_version, self.new_version, self.release_type, self.tag
        )?;
        if let Some(target) = &self.publish_target {
            write!(f, ", publish to {}", target)?;
        }
        Ok(())
    }
}

/// Interactive collaborator consulted during a release
pub trait ReleasePrompter {
    /// Whether to go ahead with the plan
    fn confirm_release(&self, plan: &ReleasePlan) -> Result<bool>;

    /// Bump type for a package using the prompt strategy
    fn get_version_bump(&self, pkg: &PackageContext) -> Result<ReleaseType>;

    /// Whether to create a changelog for a package that has none
    fn confirm_changelog_creation(&self, package: &str) -> Result<bool>;
}

/// Prompter with fixed answers, for CI and other unattended runs
#[derive(Debug, Clone)]
pub struct AutoConfirm {
    confirm: bool,
    create_changelog: bool,
    bump: ReleaseType,
}

impl AutoConfirm {
    /// Accept every release, create missing changelogs and choose patch
    pub fn new() -> Self {
        Self {
            confirm: true,
            create_changelog: true,
            bump: ReleaseType::Patch,
        }
    }

    /// Decline every release
    pub fn declining() -> Self {
        Self {
            confirm: false,
            ..Self::new()
        }
    }

    /// Answer `bump` when asked for a version bump
    pub fn with_bump(mut self, bump: ReleaseType) -> Self {
        self.bump = bump;
        self
    }

    /// Set whether missing changelogs are created
    pub fn with_changelog_creation(mut self, create: bool) -> Self {
        self.create_changelog = create;
        self
    }
}

impl Default for AutoConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleasePrompter for AutoConfirm {
    fn confirm_release(&self, plan: &ReleasePlan) -> Result<bool> {
        info!(plan = %plan, confirmed = self.confirm, "release plan");
        Ok(self.confirm)
    }

    fn get_version_bump(&self, pkg: &PackageContext) -> Result<ReleaseType> {
        info!(package = %pkg.name, release_type = %self.bump, "using configured bump");
        Ok(self.bump)
    }

    fn confirm_changelog_creation(&self, package: &str) -> Result<bool> {
        info!(package, create = self.create_changelog, "missing changelog");
        Ok(self.create_changelog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> ReleasePlan {
        ReleasePlan {
            package: "@acme/app".to_string(),
            current_version: "1.0.0".to_string(),
            new_version: "1.1.0".to_string(),
            release_type: ReleaseType::Minor,
            changelog: "- feat: search".to_string(),
            tag: "@acme/app@1.1.0".to_string(),
            publish_target: Some("https://registry.npmjs.org/ (latest)".to_string()),
            latest_published: Some("1.0.0".to_string()),
            dry_run: false,
        }
    }

    #[test]
    fn test_plan_display() {
        assert_eq!(
            plan().to_string(),
            "@acme/app 1.0.0 -> 1.1.0 (minor), tag @acme/app@1.1.0, publish to https://registry.npmjs.org/ (latest)"
        );
    }

    #[test]
    fn test_auto_confirm() {
        let pkg = PackageContext::new("@acme/app", "/repo/app", "1.0.0");

        let auto = AutoConfirm::new().with_bump(ReleaseType::Minor);
        assert!(auto.confirm_release(&plan()).unwrap());
        assert_eq!(auto.get_version_bump(&pkg).unwrap(), ReleaseType::Minor);
        assert!(auto.confirm_changelog_creation("@acme/app").unwrap());

        let declining = AutoConfirm::declining().with_changelog_creation(false);
        assert!(!declining.confirm_release(&plan()).unwrap());
        assert!(!declining.confirm_changelog_creation("@acme/app").unwrap());
    }
}
