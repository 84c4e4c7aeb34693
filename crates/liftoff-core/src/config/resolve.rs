//! Per-package configuration resolution
//!
//! The effective configuration for a package is the root configuration,
//! overlaid with the first package pattern that matches the package name,
//! overlaid with the partial configuration stored in the package directory.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::loader::load_package_overrides;
use super::types::{Config, ReleaseConfig};

/// Compiled root configuration with its pattern overrides
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    base: Value,
    patterns: Vec<(GlobMatcher, Map<String, Value>)>,
}

impl ConfigResolver {
    /// Compile the pattern overrides of a root configuration
    pub fn new(config: &Config) -> Result<Self> {
        let base = serde_json::to_value(&config.release)?;
        let mut patterns = Vec::with_capacity(config.packages.len());

        for package in &config.packages {
            patterns.push((compile_pattern(&package.pattern)?, package.settings.clone()));
        }

        Ok(Self { base, patterns })
    }

    /// Resolve the configuration for a package without reading its directory
    pub fn resolve_name(&self, package_name: &str) -> Result<ReleaseConfig> {
        self.resolve_with(package_name, None)
    }

    /// Resolve the configuration for a package, including its own config file
    pub fn resolve(&self, package_name: &str, package_dir: &Path) -> Result<ReleaseConfig> {
        let local = load_package_overrides(package_dir)?;
        self.resolve_with(package_name, local.as_ref())
    }

    fn resolve_with(
        &self,
        package_name: &str,
        local: Option<&Map<String, Value>>,
    ) -> Result<ReleaseConfig> {
        let mut merged = self.base.clone();

        if let Some((matcher, settings)) = self
            .patterns
            .iter()
            .find(|(matcher, _)| matcher.is_match(package_name))
        {
            debug!(
                package = package_name,
                pattern = matcher.glob().glob(),
                "applying pattern override"
            );
            merge(&mut merged, settings);
        }

        if let Some(local) = local {
            debug!(package = package_name, "applying package override");
            merge(&mut merged, local);
        }

        let config: ReleaseConfig = serde_json::from_value(merged).map_err(|e| {
            ConfigError::ParseError(format!("configuration for {}: {}", package_name, e))
        })?;
        Ok(config)
    }
}

/// Compile a package-name glob; `*` also crosses `/` so `@scope/*` works.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(false)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Deep-merge `overlay` into `target`; objects merge, everything else replaces
fn merge(target: &mut Value, overlay: &Map<String, Value>) {
    let Value::Object(target_map) = target else {
        *target = Value::Object(overlay.clone());
        return;
    };

    for (key, value) in overlay {
        match (target_map.get_mut(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(nested)) => merge(existing, nested),
            _ => {
                target_map.insert(key.clone(), value.clone());
            }
        }
    }
}
