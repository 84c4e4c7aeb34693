//! Configuration loading

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "toml")
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let value = if is_toml(path) {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };
    Ok(value)
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if is_toml(path) { "TOML" } else { "YAML" };
    info!(path = %path.display(), format, "loading config");

    let config: Config = parse_file(path)?;

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find a configuration file directly inside `dir`
pub fn config_file_in(dir: &Path) -> Option<PathBuf> {
    config_file_names()
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Find configuration file in directory or parent directories.
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        if let Some(path) = config_file_in(&current) {
            info!(path = %path.display(), "found config file");
            return Some(path);
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults
///
/// A missing file falls back to defaults; a file that exists but fails to
/// parse or validate is still an error.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match find_config(dir) {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => {
            warn!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}

/// Load the partial configuration stored in a package directory, if any
pub fn load_package_overrides(
    package_dir: &Path,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
    let Some(path) = config_file_in(package_dir) else {
        return Ok(None);
    };
    debug!(path = %path.display(), "loading package overrides");

    match parse_file::<serde_json::Value>(&path)? {
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::Null => Ok(None),
        _ => Err(ConfigError::ParseError(format!(
            "{} must contain a mapping",
            path.display()
        ))
        .into()),
    }
}
