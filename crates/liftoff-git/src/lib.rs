//! Liftoff Git - Version-control gateway for release orchestration
//!
//! This crate wraps a local working copy: status validation, change
//! detection, commit history, tagging, release commits and pushing.

mod commits;
mod remote;
mod repository;
mod status;
mod tags;
pub mod types;

#[cfg(test)]
mod testing;

pub use repository::{GitRepo, Result};
pub use tags::select_last_tag;
pub use types::{GitCommit, StatusOptions};
