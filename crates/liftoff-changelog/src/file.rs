//! On-disk changelog file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::{debug, info, instrument};

use liftoff_core::config::{ChangelogConfig, ChangelogFormat};
use liftoff_core::error::{ChangelogError, VersionError};
use liftoff_core::types::PackageContext;
use liftoff_core::Result;

use crate::types::ChangelogSection;

/// Heading generated entries are inserted beneath
pub const UNRELEASED_HEADING: &str = "## [Unreleased]";

/// Contents of a newly created changelog
pub const CHANGELOG_TEMPLATE: &str = "# Changelog\n\n## [Unreleased]\n";

static VERSION_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^## \[(?P<version>\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)\](?: - (?P<date>\d{4}-\d{2}-\d{2}))?$",
    )
    .expect("Invalid regex")
});

/// A package changelog file
#[derive(Debug, Clone)]
pub struct ChangelogFile {
    path: PathBuf,
    format: ChangelogFormat,
}

impl ChangelogFile {
    /// Changelog at an explicit path, in the default format
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: ChangelogFormat::default(),
        }
    }

    /// Set the format releases are written in
    pub fn with_format(mut self, format: ChangelogFormat) -> Self {
        self.format = format;
        self
    }

    /// Changelog configured for `pkg`; relative package paths resolve against `root_dir`
    pub fn for_package(pkg: &PackageContext, config: &ChangelogConfig, root_dir: &Path) -> Self {
        let dir = if pkg.path.is_absolute() {
            pkg.path.clone()
        } else {
            root_dir.join(&pkg.path)
        };
        Self::new(dir.join(&config.file)).with_format(config.format)
    }

    /// File location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn invalid(&self, reason: impl Into<String>) -> ChangelogError {
        ChangelogError::Invalid {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Fail when the file is missing but required, or malformed for `config.format`
    #[instrument(skip(self, config), fields(path = %self.path.display()))]
    pub fn validate(&self, config: &ChangelogConfig) -> Result<()> {
        if !self.exists() {
            if config.required {
                return Err(self.invalid("changelog file is missing").into());
            }
            debug!("changelog missing and not required");
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.path).map_err(ChangelogError::from)?;
        let mut problems = Vec::new();

        if !content.lines().any(|l| l.trim_end() == UNRELEASED_HEADING) {
            problems.push(format!("missing `{}` heading", UNRELEASED_HEADING));
        }

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.starts_with("## ") && line != UNRELEASED_HEADING {
                match VERSION_HEADING_RE.captures(line) {
                    Some(caps) => {
                        if let Some(date) = caps.name("date") {
                            if NaiveDate::parse_from_str(date.as_str(), "%Y-%m-%d").is_err() {
                                problems.push(format!("line {}: invalid date {}", idx + 1, date.as_str()));
                            }
                        }
                    }
                    None => problems.push(format!(
                        "line {}: expected `## [x.y.z] - YYYY-MM-DD`, found `{}`",
                        idx + 1,
                        line
                    )),
                }
            } else if config.format == ChangelogFormat::KeepAChangelog {
                if let Some(title) = line.strip_prefix("### ") {
                    if ChangelogSection::from_title(title.trim()).is_none() {
                        problems.push(format!("line {}: unknown section `{}`", idx + 1, title.trim()));
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(self.invalid(problems.join("; ")).into())
        }
    }

    /// List entries under the Unreleased heading; empty when the file is missing
    pub fn unreleased_changes(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(ChangelogError::from)?;

        let changes = unreleased_block(&content)
            .iter()
            .filter_map(|line| {
                let line = line.trim();
                line.strip_prefix("- ")
                    .or_else(|| line.strip_prefix("* "))
                    .map(|s| s.trim().to_string())
            })
            .collect();
        Ok(changes)
    }

    /// Insert the release section for `pkg.new_version` dated today
    pub fn update(&self, pkg: &PackageContext, entry: &str) -> Result<()> {
        self.update_with_date(pkg, entry, Local::now().date_naive())
    }

    /// Insert `## [version] - date` beneath the Unreleased heading.
    ///
    /// Items already under Unreleased move into the new section ahead of
    /// `entry`; in the Keep a Changelog format they are merged into the
    /// matching sections. A missing file is created from [`CHANGELOG_TEMPLATE`].
    #[instrument(skip(self, pkg, entry), fields(package = %pkg.name, path = %self.path.display()))]
    pub fn update_with_date(&self, pkg: &PackageContext, entry: &str, date: NaiveDate) -> Result<()> {
        let version = pkg.new_version.as_deref().ok_or_else(|| {
            VersionError::InvalidInput(format!("no new version set for {}", pkg.name))
        })?;

        let content = if self.exists() {
            std::fs::read_to_string(&self.path).map_err(ChangelogError::from)?
        } else {
            info!("creating changelog");
            CHANGELOG_TEMPLATE.to_string()
        };

        let updated = insert_release(&content, version, entry, self.format, date);
        std::fs::write(&self.path, updated).map_err(ChangelogError::from)?;

        info!(version, "changelog updated");
        Ok(())
    }
}

/// Lines between the Unreleased heading and the next `## ` heading
fn unreleased_block(content: &str) -> Vec<&str> {
    content
        .lines()
        .skip_while(|l| l.trim_end() != UNRELEASED_HEADING)
        .skip(1)
        .take_while(|l| !l.starts_with("## "))
        .collect()
}

/// Merge carried and generated lines so each section heading appears once.
///
/// Lines outside a known section keep their place ahead of the sections.
fn merge_sections<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut loose: Vec<&str> = Vec::new();
    let mut sections: BTreeMap<ChangelogSection, Vec<&str>> = BTreeMap::new();
    let mut current = None;

    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(title) = line.strip_prefix("### ") {
            current = ChangelogSection::from_title(title.trim());
            if current.is_some() {
                continue;
            }
        }
        match current {
            Some(section) => sections.entry(section).or_default().push(line),
            None => loose.push(line),
        }
    }

    let mut blocks = Vec::new();
    if !loose.is_empty() {
        blocks.push(loose.join("\n"));
    }
    for (section, items) in sections {
        blocks.push(format!("### {}\n\n{}", section.title(), items.join("\n")));
    }
    blocks.join("\n\n")
}

fn insert_release(
    content: &str,
    version: &str,
    entry: &str,
    format: ChangelogFormat,
    date: NaiveDate,
) -> String {
    let lines: Vec<&str> = content.lines().collect();

    let (head, tail): (Vec<&str>, Vec<&str>) =
        match lines.iter().position(|l| l.trim_end() == UNRELEASED_HEADING) {
            Some(idx) => {
                let rest = &lines[idx + 1..];
                let next = rest
                    .iter()
                    .position(|l| l.starts_with("## "))
                    .unwrap_or(rest.len());
                (lines[..=idx].to_vec(), rest[next..].to_vec())
            }
            None => {
                // Place the heading after the title, or at the top
                let title_end = lines
                    .iter()
                    .position(|l| l.starts_with("# "))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                let mut head = lines[..title_end].to_vec();
                if !head.is_empty() {
                    head.push("");
                }
                head.push(UNRELEASED_HEADING);
                (head, lines[title_end..].to_vec())
            }
        };

    let carried = unreleased_block(content);
    let body = match format {
        ChangelogFormat::KeepAChangelog => {
            merge_sections(carried.iter().copied().chain(entry.lines()))
        }
        ChangelogFormat::Conventional => carried
            .iter()
            .map(|l| l.trim_end())
            .chain(std::iter::once(entry.trim()))
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    };

    let mut out = head.join("\n");
    out.push_str(&format!("\n\n## [{}] - {}\n", version, date.format("%Y-%m-%d")));
    if !body.is_empty() {
        out.push('\n');
        out.push_str(&body);
        out.push('\n');
    }

    let tail = tail.join("\n");
    let tail = tail.trim_start_matches('\n');
    if !tail.is_empty() {
        out.push('\n');
        out.push_str(tail);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
