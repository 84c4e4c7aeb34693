//! Markdown changelog formatter

use tracing::{debug, instrument};

use crate::types::ChangelogEntry;

/// Renders an entry as the markdown body of a release section
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Create a new markdown formatter
    pub fn new() -> Self {
        Self
    }

    /// Format the entry; untitled sections render as a bare list
    #[instrument(skip(self, entry), fields(section_count = entry.sections.len()))]
    pub fn format(&self, entry: &ChangelogEntry) -> String {
        let blocks: Vec<String> = entry
            .sections
            .iter()
            .filter(|section| !section.is_empty())
            .map(|section| {
                let list = section
                    .items
                    .iter()
                    .map(|item| format!("- {}", item))
                    .collect::<Vec<_>>()
                    .join("\n");
                match section.title {
                    Some(title) => format!("### {}\n\n{}", title.title(), list),
                    None => list,
                }
            })
            .collect();

        let output = blocks.join("\n\n");
        debug!(output_len = output.len(), "markdown changelog formatted");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangelogSection, Section};

    fn section(title: Option<ChangelogSection>, items: &[&str]) -> Section {
        let mut section = Section::new(title);
        for item in items {
            section.add_item(*item);
        }
        section
    }

    #[test]
    fn test_format_flat_list() {
        let mut entry = ChangelogEntry::new();
        entry.add_section(section(None, &["feat: add x", "fix: y"]));

        assert_eq!(MarkdownFormatter::new().format(&entry), "- feat: add x\n- fix: y");
    }

    #[test]
    fn test_format_sections() {
        let mut entry = ChangelogEntry::new();
        entry.add_section(section(Some(ChangelogSection::Added), &["add x"]));
        entry.add_section(section(Some(ChangelogSection::Fixed), &["fix y", "fix z"]));

        assert_eq!(
            MarkdownFormatter::new().format(&entry),
            "### Added\n\n- add x\n\n### Fixed\n\n- fix y\n- fix z"
        );
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(MarkdownFormatter::new().format(&ChangelogEntry::new()), "");
    }
}
