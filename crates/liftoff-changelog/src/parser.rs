//! Conventional Commits parser
//!
//! Parses commits following the Conventional Commits specification:
//! https://www.conventionalcommits.org/

use regex::Regex;
use std::sync::LazyLock;

use liftoff_git::GitCommit;

use crate::types::{Footer, ParsedCommit};

/// Regex for parsing conventional commit messages
static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<description>.+)$",
    )
    .expect("Invalid regex")
});

/// Regex for parsing footer lines
static FOOTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<token>BREAKING CHANGE|[A-Za-z-]+): (?P<value>.+)$").expect("Invalid regex")
});

/// Parser for Conventional Commits format
#[derive(Debug, Clone, Default)]
pub struct ConventionalParser;

impl ConventionalParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a commit, `None` when the summary is not a conventional commit
    pub fn parse(&self, commit: &GitCommit) -> Option<ParsedCommit> {
        let caps = CONVENTIONAL_REGEX.captures(&commit.message)?;

        let commit_type = caps.name("type")?.as_str().to_lowercase();
        let scope = caps.name("scope").map(|m| m.as_str().to_string());
        let breaking_marker = caps.name("breaking").is_some();
        let description = caps.name("description")?.as_str().to_string();

        let (body, footers) = match commit.body.as_deref() {
            Some(body) => parse_body(body),
            None => (None, Vec::new()),
        };

        let breaking_in_footer = footers.iter().any(|f| {
            f.token.eq_ignore_ascii_case("BREAKING CHANGE")
                || f.token.eq_ignore_ascii_case("BREAKING-CHANGE")
        });

        Some(ParsedCommit {
            hash: commit.hash.clone(),
            commit_type,
            scope,
            breaking: breaking_marker || breaking_in_footer,
            description,
            body,
            footers,
            date: commit.date,
        })
    }
}

/// Split a body into free text and trailing footers
fn parse_body(body: &str) -> (Option<String>, Vec<Footer>) {
    let mut footers: Vec<Footer> = Vec::new();
    let mut body_lines = Vec::new();
    let mut in_footer = false;

    for line in body.lines() {
        if let Some(caps) = FOOTER_REGEX.captures(line) {
            in_footer = true;
            footers.push(Footer {
                token: caps["token"].to_string(),
                value: caps["value"].to_string(),
            });
        } else if in_footer && line.starts_with(' ') {
            // Continuation of previous footer
            if let Some(last) = footers.last_mut() {
                last.value.push('\n');
                last.value.push_str(line.trim());
            }
        } else if !in_footer {
            body_lines.push(line);
        }
    }

    let text = body_lines.join("\n").trim().to_string();
    ((!text.is_empty()).then_some(text), footers)
}
