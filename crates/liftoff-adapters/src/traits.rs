//! Registry gateway trait

use liftoff_core::config::{NpmConfig, PackageManager};
use liftoff_core::error::Result;
use liftoff_core::types::{PackageContext, PublishOutcome};

use crate::archive::PackageArchiveInfo;

/// Version reported when a package has never been published
pub const UNPUBLISHED_VERSION: &str = "0.0.0";

/// Package-manager operations used by a release.
///
/// Implementations hold configuration only; every call is independent.
pub trait PackageRegistry: Send + Sync {
    /// Ecosystem this registry drives
    fn kind(&self) -> PackageManager;

    /// Check the user is logged in to the configured registry, returning the username
    fn validate_auth(&self, config: &NpmConfig) -> Result<String>;

    /// Publish the package with the configured registry, tag, access and OTP
    fn publish(&self, pkg: &PackageContext, config: &NpmConfig) -> Result<PublishOutcome>;

    /// Latest published version, or [`UNPUBLISHED_VERSION`] when the lookup fails
    fn get_latest_version(&self, name: &str, config: &NpmConfig) -> String;

    /// Whether installing would leave the lockfile unchanged
    fn check_workspace_integrity(&self) -> bool;

    /// Upgrade exactly `names` in the package directory
    fn update_dependencies(&self, pkg: &PackageContext, names: &[String]) -> Result<()>;

    /// Write `version` into the manifest with the package manager's own command
    fn set_version(&self, pkg: &PackageContext, version: &str) -> Result<()>;

    /// Pack the package, describe the artifact and delete it again
    fn pack(&self, pkg: &PackageContext) -> Result<PackageArchiveInfo>;

    /// Run a package script
    fn run_script(&self, pkg: &PackageContext, script: &str) -> Result<()>;
}
