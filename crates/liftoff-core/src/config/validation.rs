//! Configuration validation

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::resolve::compile_pattern;
use super::types::{Config, ReleaseConfig};

static PRERELEASE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z-]+$").expect("Invalid regex"));

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_release_config(&config.release)?;
    validate_packages(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Validate an effective per-package configuration
pub fn validate_release_config(config: &ReleaseConfig) -> Result<()> {
    validate_git(config)?;
    validate_npm(config)?;
    validate_versioning(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> crate::error::LiftoffError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
    .into()
}

fn validate_git(config: &ReleaseConfig) -> Result<()> {
    if config.git.remote.trim().is_empty() {
        return Err(invalid("git.remote", "remote cannot be empty"));
    }

    if !config.git.commit_message.contains("${version}") {
        return Err(invalid(
            "git.commit_message",
            "must contain ${version} placeholder",
        ));
    }

    if config.git.allowed_branches.iter().any(|b| b.trim().is_empty()) {
        return Err(invalid(
            "git.allowed_branches",
            "branch names cannot be empty",
        ));
    }

    Ok(())
}

fn validate_npm(config: &ReleaseConfig) -> Result<()> {
    let registry = url::Url::parse(&config.npm.registry)
        .map_err(|e| invalid("npm.registry", format!("not a valid URL: {}", e)))?;
    if !matches!(registry.scheme(), "http" | "https") {
        return Err(invalid("npm.registry", "must use http or https"));
    }

    if config.npm.tag.trim().is_empty() {
        return Err(invalid("npm.tag", "distribution tag cannot be empty"));
    }

    Ok(())
}

fn validate_versioning(config: &ReleaseConfig) -> Result<()> {
    if let Some(id) = &config.versioning.prerelease_id {
        if !PRERELEASE_ID.is_match(id) {
            return Err(invalid(
                "versioning.prerelease_id",
                "may only contain alphanumerics and hyphens",
            ));
        }
    }

    Ok(())
}

fn validate_packages(config: &Config) -> Result<()> {
    if !config.packages.is_empty() {
        debug!(count = config.packages.len(), "validating package overrides");
    }
    for (i, package) in config.packages.iter().enumerate() {
        if package.pattern.is_empty() {
            return Err(invalid(
                format!("packages[{}].pattern", i),
                "pattern cannot be empty",
            ));
        }
        compile_pattern(&package.pattern)?;
    }

    Ok(())
}
