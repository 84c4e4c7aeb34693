//! package.json handling
//!
//! The manifest is kept as an ordered JSON object so edits leave every other
//! key, and the key order, exactly as the user wrote them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use liftoff_core::error::{AdapterError, Result};

/// Dependency sections rewritten on release, in manifest order
pub const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "devDependencies", "peerDependencies"];

/// A package.json document
#[derive(Debug, Clone, PartialEq)]
pub struct PackageJson {
    fields: Map<String, Value>,
}

impl PackageJson {
    /// Manifest location for a package directory
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join("package.json")
    }

    /// Load package.json from path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| AdapterError::ManifestNotFound(path.to_path_buf()))?;
        Self::parse(&content)
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        match serde_json::from_str(content) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(_) => Err(AdapterError::ManifestParseError(
                "package.json must contain a JSON object".to_string(),
            )
            .into()),
            Err(e) => Err(AdapterError::ManifestParseError(e.to_string()).into()),
        }
    }

    /// Save package.json to path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.fields)
            .map_err(|e| AdapterError::ManifestUpdateError(e.to_string()))?;

        std::fs::write(path, format!("{}\n", content))
            .map_err(|e| AdapterError::ManifestUpdateError(e.to_string()).into())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Package name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Package version
    pub fn version(&self) -> Option<&str> {
        self.str_field("version")
    }

    /// Set the version field
    pub fn set_version(&mut self, version: &str) {
        self.fields
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Whether the package is marked private
    pub fn is_private(&self) -> bool {
        self.fields
            .get("private")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether a script with this name is defined
    pub fn has_script(&self, name: &str) -> bool {
        self.fields
            .get("scripts")
            .and_then(Value::as_object)
            .is_some_and(|scripts| scripts.contains_key(name))
    }

    /// Entries of one dependency section
    pub fn dependencies(&self, section: &str) -> BTreeMap<String, String> {
        self.fields
            .get(section)
            .and_then(Value::as_object)
            .map(|deps| {
                deps.iter()
                    .filter_map(|(name, range)| {
                        range.as_str().map(|r| (name.clone(), r.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pin every listed dependency to `^{version}` across all sections.
    ///
    /// Ranges using the `workspace:` protocol are left alone. Returns the
    /// names whose range changed, sorted and without duplicates.
    pub fn pin_dependencies(&mut self, updates: &BTreeMap<String, String>) -> Vec<String> {
        let mut changed = Vec::new();

        for section in DEPENDENCY_SECTIONS {
            let Some(deps) = self.fields.get_mut(section).and_then(Value::as_object_mut) else {
                continue;
            };
            for (name, version) in updates {
                let Some(current) = deps.get(name).and_then(Value::as_str) else {
                    continue;
                };
                if current.starts_with("workspace:") {
                    debug!(section, name = %name, range = current, "keeping workspace range");
                    continue;
                }
                let pinned = format!("^{}", version);
                if current != pinned {
                    deps.insert(name.clone(), Value::String(pinned));
                    changed.push(name.clone());
                }
            }
        }

        changed.sort();
        changed.dedup();
        changed
    }
}
