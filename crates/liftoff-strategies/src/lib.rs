//! Liftoff Strategies - Version calculation for release management
//!
//! Semantic version parsing, npm-compatible increments, strict version
//! validation and bump inference from conventional commit messages.

mod inference;
mod strategy;
pub mod types;
mod validation;

pub use inference::{infer_release_type, BREAKING_CHANGE_MARKER};
pub use strategy::{determine_version, SemVerStrategy};
pub use types::VersionComponents;
pub use validation::validate_version;

use liftoff_core::error::VersionError;

/// Result type for version operations
pub type Result<T> = std::result::Result<T, VersionError>;
