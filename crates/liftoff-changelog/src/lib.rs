//! Liftoff Changelog - Changelog generation for release management
//!
//! Commits are parsed as conventional commits, grouped into an entry,
//! rendered as markdown and written beneath the `## [Unreleased]` heading
//! of the package changelog.

pub mod file;
pub mod formatter;
pub mod generator;
pub mod parser;
pub mod types;

pub use file::ChangelogFile;
pub use formatter::MarkdownFormatter;
pub use generator::{ChangelogEngine, ChangelogGenerator};
pub use parser::ConventionalParser;
pub use types::{ChangelogEntry, ChangelogSection, Footer, ParsedCommit, Section};
