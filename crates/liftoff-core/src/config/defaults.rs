//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "liftoff.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "liftoff.toml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        "liftoff.yml",
        DEFAULT_CONFIG_TOML,
        ".liftoff.yaml",
        ".liftoff.yml",
        ".liftoff.toml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = Config::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Liftoff Configuration

package_manager: yarn

git:
  remote: origin
  allowed_branches: [main, master]
  require_clean_working_directory: true
  require_upstream_tracking: true
  commit_message: "chore(release): release ${packageName}@${version}"
  push: true

npm:
  publish: true
  registry: https://registry.npmjs.org/
  tag: latest
  access: public
  required_files: [package.json, README.md]

changelog:
  format: conventional
  file: CHANGELOG.md
  conventional_commits: true

versioning:
  strategy: conventional

hooks:
  pre_release: []
  post_release: []

packages: []
"#;
