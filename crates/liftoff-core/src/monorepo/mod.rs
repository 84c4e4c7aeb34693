//! Monorepo support for multi-package repositories
//!
//! - Workspace detection from the root `package.json` `workspaces` field
//! - Package discovery with glob patterns
//! - Workspace-internal dependency detection by scope prefix

pub mod discovery;
pub mod workspace;

pub use discovery::{discover_packages, read_package};
pub use workspace::Workspace;
