//! Liftoff - Release orchestration for npm and yarn monorepos
//!
//! [`ReleaseOrchestrator`] drives a package from its current version to a
//! tagged, committed and optionally published release. It composes the
//! workspace crates:
//!
//! - `liftoff-core`: configuration, workspace index, hooks and errors
//! - `liftoff-git`: repository status, tags, commits and push
//! - `liftoff-strategies`: version arithmetic and bump inference
//! - `liftoff-changelog`: changelog generation and file updates
//! - `liftoff-adapters`: npm and yarn registry gateways
//!
//! Interactive decisions go through a [`ReleasePrompter`]; [`AutoConfirm`]
//! answers them for unattended runs. Logging uses `tracing`; install a
//! subscriber in the embedding application to see it.

pub mod integrity;
pub mod prompt;
pub mod release;
pub mod version;

#[cfg(test)]
mod testing;

pub use integrity::IntegrityChecker;
pub use prompt::{AutoConfirm, ReleasePlan, ReleasePrompter};
pub use release::{ReleaseOptions, ReleaseOrchestrator};
pub use version::VersionEngine;

pub use liftoff_core::{LiftoffError, ReleaseResult, Result};
