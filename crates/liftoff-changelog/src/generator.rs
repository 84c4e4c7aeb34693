//! Changelog generation

use std::path::Path;

use tracing::{debug, info, instrument};

use liftoff_core::config::{ChangelogConfig, ChangelogFormat, ReleaseConfig};
use liftoff_core::types::PackageContext;
use liftoff_core::Result;
use liftoff_git::{GitCommit, GitRepo};

use crate::file::ChangelogFile;
use crate::formatter::MarkdownFormatter;
use crate::parser::ConventionalParser;
use crate::types::{ChangelogEntry, ChangelogSection, Section};

/// Changelog generator
pub struct ChangelogGenerator {
    parser: ConventionalParser,
    formatter: MarkdownFormatter,
    format: ChangelogFormat,
}

impl ChangelogGenerator {
    /// Create a generator for the given format
    pub fn new(format: ChangelogFormat) -> Self {
        Self {
            parser: ConventionalParser::new(),
            formatter: MarkdownFormatter::new(),
            format,
        }
    }

    /// Group commits into an entry.
    ///
    /// The conventional format lists every commit summary as-is. Keep a
    /// Changelog groups by commit type and omits empty sections.
    #[instrument(skip(self, commits), fields(commit_count = commits.len(), format = ?self.format))]
    pub fn generate(&self, commits: &[GitCommit]) -> ChangelogEntry {
        let mut entry = ChangelogEntry::new();

        match self.format {
            ChangelogFormat::Conventional => {
                let mut section = Section::new(None);
                for commit in commits {
                    section.add_item(commit.message.clone());
                }
                entry.add_section(section);
            }
            ChangelogFormat::KeepAChangelog => {
                let mut sections: Vec<Section> = ChangelogSection::ALL
                    .iter()
                    .map(|s| Section::new(Some(*s)))
                    .collect();

                for commit in commits {
                    let (kind, item) = match self.parser.parse(commit) {
                        Some(parsed) => {
                            let mut item = parsed.description.clone();
                            if let Some(scope) = &parsed.scope {
                                item = format!("{}: {}", scope, item);
                            }
                            if parsed.breaking {
                                item = format!("**BREAKING** {}", item);
                            }
                            (ChangelogSection::for_commit_type(&parsed.commit_type), item)
                        }
                        None => (ChangelogSection::Changed, commit.message.clone()),
                    };
                    // ALL is in declaration order, so the discriminant indexes it
                    sections[kind as usize].add_item(item);
                }

                for section in sections {
                    entry.add_section(section);
                }
            }
        }

        debug!(section_count = entry.sections.len(), "changelog sections built");
        entry
    }

    /// Format a changelog entry to string
    pub fn format(&self, entry: &ChangelogEntry) -> String {
        self.formatter.format(entry)
    }

    /// Generate and format in one step
    pub fn generate_formatted(&self, commits: &[GitCommit]) -> String {
        let entry = self.generate(commits);
        self.format(&entry)
    }
}

/// Changelog operations for packages in one repository
pub struct ChangelogEngine<'a> {
    repo: &'a GitRepo,
}

impl<'a> ChangelogEngine<'a> {
    /// Create an engine reading history from `repo`
    pub fn new(repo: &'a GitRepo) -> Self {
        Self { repo }
    }

    /// Changelog text for the commits since the package's last tag
    #[instrument(skip(self, pkg, config), fields(package = %pkg.name))]
    pub fn generate(&self, pkg: &PackageContext, config: &ReleaseConfig) -> Result<String> {
        let tag = self
            .repo
            .get_last_tag(&pkg.name, config.git.tag_prefix.as_deref())?;
        let commits = self.repo.commits_since_tag(&tag)?;

        let text = ChangelogGenerator::new(config.changelog.format).generate_formatted(&commits);
        info!(tag = %tag, commits = commits.len(), "generated changelog");
        Ok(text)
    }

    /// Check the package changelog exists when required and is well formed
    pub fn validate(
        &self,
        pkg: &PackageContext,
        config: &ChangelogConfig,
        root_dir: &Path,
    ) -> Result<()> {
        ChangelogFile::for_package(pkg, config, root_dir).validate(config)
    }

    /// Entries currently listed under the Unreleased heading
    pub fn unreleased_changes(
        &self,
        pkg: &PackageContext,
        config: &ChangelogConfig,
    ) -> Result<Vec<String>> {
        ChangelogFile::for_package(pkg, config, self.repo.path()).unreleased_changes()
    }

    /// Insert `entry` as the section for the package's new version
    pub fn update(&self, pkg: &PackageContext, entry: &str, config: &ChangelogConfig) -> Result<()> {
        ChangelogFile::for_package(pkg, config, self.repo.path()).update(pkg, entry)
    }
}
