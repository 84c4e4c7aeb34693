//! SemVer increments

use std::cmp::Ordering;

use tracing::debug;

use liftoff_core::error::VersionError;
use liftoff_core::types::ReleaseType;

use crate::types::VersionComponents;
use crate::validation::validate_version;
use crate::Result;

/// Semantic Versioning strategy
///
/// Increments follow the npm `semver.inc` rules, so a pre-release of the
/// target version is promoted rather than skipped over.
#[derive(Debug, Clone, Default)]
pub struct SemVerStrategy;

impl SemVerStrategy {
    /// Create a new SemVer strategy
    pub fn new() -> Self {
        Self
    }

    /// Parse a version string into components
    pub fn parse(&self, version: &str) -> Result<VersionComponents> {
        let trimmed = version.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        VersionComponents::try_from(trimmed).map_err(|e| match e {
            VersionError::InvalidVersion { reason, .. } => VersionError::InvalidVersion {
                version: version.to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Compare two versions by semver precedence
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        let parse = |v: &str| {
            let v = v.strip_prefix('v').unwrap_or(v);
            semver::Version::parse(v).map_err(|e| VersionError::InvalidVersion {
                version: v.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(parse(a)?.cmp_precedence(&parse(b)?))
    }

    /// Apply a release type to `current`.
    ///
    /// Pre-release types require `preid`. `Custom` has no increment and is
    /// rejected here; use [`determine_version`] for it.
    pub fn bump(
        &self,
        current: &VersionComponents,
        release_type: ReleaseType,
        preid: Option<&str>,
    ) -> Result<VersionComponents> {
        let mut next = VersionComponents::new(current.major, current.minor, current.patch);
        let pre = current.prerelease.as_deref();

        let preid = if release_type.is_prerelease() {
            match preid.map(str::trim).filter(|id| !id.is_empty()) {
                Some(id) => Some(id),
                None => {
                    return Err(VersionError::InvalidInput(format!(
                        "a pre-release identifier is required for a {} release",
                        release_type
                    )))
                }
            }
        } else {
            None
        };

        match release_type {
            ReleaseType::Major => {
                // 2.0.0-beta.1 is promoted to 2.0.0
                if !(pre.is_some() && current.minor == 0 && current.patch == 0) {
                    next.major += 1;
                    next.minor = 0;
                    next.patch = 0;
                }
            }
            ReleaseType::Minor => {
                if !(pre.is_some() && current.patch == 0) {
                    next.minor += 1;
                    next.patch = 0;
                }
            }
            ReleaseType::Patch => {
                if pre.is_none() {
                    next.patch += 1;
                }
            }
            ReleaseType::Premajor => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
                next.prerelease = preid.map(|id| format!("{}.0", id));
            }
            ReleaseType::Preminor => {
                next.minor += 1;
                next.patch = 0;
                next.prerelease = preid.map(|id| format!("{}.0", id));
            }
            ReleaseType::Prepatch => {
                next.patch += 1;
                next.prerelease = preid.map(|id| format!("{}.0", id));
            }
            ReleaseType::Prerelease => {
                let id = preid.unwrap_or_default();
                next.prerelease = Some(match pre {
                    None => {
                        next.patch += 1;
                        format!("{}.0", id)
                    }
                    Some(pre) => next_prerelease(pre, id),
                });
            }
            ReleaseType::Custom => {
                return Err(VersionError::InvalidInput(
                    "a custom release has no increment; supply the new version".to_string(),
                ))
            }
        }

        Ok(next)
    }
}

/// Next pre-release tag for `id` given the current one.
///
/// The same identifier increments its trailing counter, anything else restarts at `{id}.0`.
fn next_prerelease(current: &str, id: &str) -> String {
    let same_id = current == id || current.starts_with(&format!("{}.", id));
    if !same_id {
        return format!("{}.0", id);
    }

    let mut parts: Vec<String> = current.split('.').map(str::to_string).collect();
    match parts.iter().rposition(|p| p.parse::<u64>().is_ok()) {
        Some(idx) => {
            let n: u64 = parts[idx].parse().unwrap_or(0);
            parts[idx] = (n + 1).to_string();
        }
        None => parts.push("0".to_string()),
    }
    parts.join(".")
}

/// Compute the version a release of `current` produces.
///
/// `custom` is the caller-supplied version for [`ReleaseType::Custom`].
pub fn determine_version(
    current: &str,
    release_type: ReleaseType,
    preid: Option<&str>,
    custom: Option<&str>,
) -> Result<String> {
    if release_type == ReleaseType::Custom {
        let version = custom.ok_or_else(|| {
            VersionError::InvalidInput("a custom release requires a new version".to_string())
        })?;
        validate_version(version)?;
        return Ok(version.to_string());
    }

    let strategy = SemVerStrategy::new();
    let components = strategy.parse(current)?;
    let next = strategy.bump(&components, release_type, preid)?;
    let version = next.to_version_string();

    debug!(current, release_type = %release_type, next = %version, "determined version");
    Ok(version)
}
