//! Changelog types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed commit from conventional commit format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCommit {
    /// Original commit hash
    pub hash: String,
    /// Commit type (feat, fix, etc.)
    pub commit_type: String,
    /// Scope (optional, in parentheses)
    pub scope: Option<String>,
    /// Whether this is a breaking change
    pub breaking: bool,
    /// Commit description
    pub description: String,
    /// Commit body
    pub body: Option<String>,
    /// Footer fields
    pub footers: Vec<Footer>,
    /// Commit timestamp
    pub date: DateTime<Utc>,
}

/// A footer field from a conventional commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footer {
    /// Footer token (e.g., "BREAKING CHANGE", "Fixes", "Refs")
    pub token: String,
    /// Footer value
    pub value: String,
}

/// Keep a Changelog section, in the order sections are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangelogSection {
    Added,
    Changed,
    Deprecated,
    Removed,
    Fixed,
    Security,
}

impl ChangelogSection {
    /// Every section in output order
    pub const ALL: [ChangelogSection; 6] = [
        Self::Added,
        Self::Changed,
        Self::Deprecated,
        Self::Removed,
        Self::Fixed,
        Self::Security,
    ];

    /// Heading text
    pub fn title(&self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Changed => "Changed",
            Self::Deprecated => "Deprecated",
            Self::Removed => "Removed",
            Self::Fixed => "Fixed",
            Self::Security => "Security",
        }
    }

    /// Section a conventional commit type belongs to
    pub fn for_commit_type(commit_type: &str) -> Self {
        match commit_type {
            "feat" => Self::Added,
            "fix" => Self::Fixed,
            "deprecated" => Self::Deprecated,
            "removed" => Self::Removed,
            "security" => Self::Security,
            // chore, refactor, docs and anything unrecognised
            _ => Self::Changed,
        }
    }

    /// Parse a heading title
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.title() == title)
    }
}

/// A group of changelog lines; untitled for the flat conventional list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading
    pub title: Option<ChangelogSection>,
    /// Lines in this section, without the list marker
    pub items: Vec<String>,
}

impl Section {
    /// Create an empty section
    pub fn new(title: Option<ChangelogSection>) -> Self {
        Self {
            title,
            items: Vec::new(),
        }
    }

    /// Add a line
    pub fn add_item(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    /// Check if section is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A generated changelog entry for one release
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Sections in output order; empty sections are never stored
    pub sections: Vec<Section>,
}

impl ChangelogEntry {
    /// Create an empty entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section, dropping it when empty
    pub fn add_section(&mut self, section: Section) {
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    /// Check if entry has any content
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
