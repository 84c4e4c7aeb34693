//! Liftoff Core - Core library for monorepo release orchestration
//!
//! This crate provides the foundational types, error handling, configuration,
//! lifecycle hooks and workspace index shared by the Liftoff crates.

pub mod config;
pub mod error;
pub mod hooks;
pub mod monorepo;
pub mod types;

pub use error::{LiftoffError, Result};
pub use hooks::{HookContext, HookRunner, HookStage, HooksConfig};
pub use monorepo::Workspace;
pub use types::{
    GitOutcome, PackageContext, PublishOutcome, ReleaseResult, ReleaseStage, ReleaseType,
};
