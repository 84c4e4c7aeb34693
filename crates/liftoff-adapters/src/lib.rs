//! Liftoff Adapters - Package-manager gateways for release orchestration
//!
//! This crate drives npm and yarn for everything a release needs from the
//! registry side: authentication, version writes, dependency upgrades,
//! packing and publishing. All process spawning goes through a
//! [`CommandRunner`] so callers can substitute their own.

pub mod archive;
pub mod npm;
pub mod registry;
pub mod runner;
mod traits;
pub mod yarn;

#[cfg(test)]
mod testing;

pub use archive::{ArchiveFile, PackageArchiveInfo};
pub use npm::{NpmRegistry, PackageJson};
pub use registry::{registry_for, registry_with_runner};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemCommandRunner};
pub use traits::{PackageRegistry, UNPUBLISHED_VERSION};
pub use yarn::YarnRegistry;
