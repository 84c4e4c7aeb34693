//! Strict semantic version validation

use std::sync::LazyLock;

use regex::Regex;

use liftoff_core::error::VersionError;

use crate::Result;

static PRERELEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][0-9A-Za-z.-]*$").expect("Invalid regex"));

static BUILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z.-]+$").expect("Invalid regex"));

/// Check `version` has the strict `MAJOR.MINOR.PATCH[-pre][+build]` shape.
///
/// Every violated rule is reported, separated by `; `.
pub fn validate_version(version: &str) -> Result<()> {
    let mut reasons = Vec::new();

    if version.trim().is_empty() {
        return Err(VersionError::InvalidVersion {
            version: version.to_string(),
            reason: "version is empty".to_string(),
        });
    }

    let (rest, build) = match version.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (version, None),
    };

    if rest.starts_with('-') {
        reasons.push("major, minor and patch must be non-negative".to_string());
    }

    let body = rest.trim_start_matches('-');
    let (core, prerelease) = match body.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (body, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        reasons.push(format!(
            "expected MAJOR.MINOR.PATCH but found {} component(s)",
            parts.len()
        ));
    } else {
        for (label, part) in ["major", "minor", "patch"].iter().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                reasons.push(format!("{} must be a non-negative integer", label));
            } else if part.len() > 1 && part.starts_with('0') {
                reasons.push(format!("{} must not have leading zeros", label));
            }
        }
    }

    if let Some(pre) = prerelease {
        if !PRERELEASE_RE.is_match(pre) {
            reasons.push(
                "pre-release must start with a letter and contain only alphanumerics, dots and hyphens"
                    .to_string(),
            );
        } else if pre.split('.').any(str::is_empty) {
            reasons.push("pre-release identifiers must not be empty".to_string());
        }
    }

    if let Some(build) = build {
        if !BUILD_RE.is_match(build) {
            reasons.push(
                "build metadata must contain only alphanumerics, dots and hyphens".to_string(),
            );
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(VersionError::InvalidVersion {
            version: version.to_string(),
            reason: reasons.join("; "),
        })
    }
}
