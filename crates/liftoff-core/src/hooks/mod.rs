//! Lifecycle hooks
//!
//! Shell commands run around a package release:
//! - pre-release: after confirmation, before any mutation
//! - post-release: after tagging, committing, pushing and publishing
//!
//! Each command runs in the package directory with the release context
//! exported as `LIFTOFF_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, WorkflowError};
use crate::types::PackageContext;

/// Hook lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Before any release mutation
    PreRelease,
    /// After the release completed
    PostRelease,
}

impl HookStage {
    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreRelease => "pre-release",
            Self::PostRelease => "post-release",
        }
    }

    /// Get all stages in order
    pub fn all() -> &'static [HookStage] {
        &[Self::PreRelease, Self::PostRelease]
    }
}

/// Hooks configured for a package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub pre_release: Vec<String>,
    pub post_release: Vec<String>,
}

impl HooksConfig {
    /// Commands configured for a stage
    pub fn commands(&self, stage: HookStage) -> &[String] {
        match stage {
            HookStage::PreRelease => &self.pre_release,
            HookStage::PostRelease => &self.post_release,
        }
    }
}

/// Result of executing a hook
#[derive(Debug, Clone)]
pub struct HookResult {
    /// The stage that was executed
    pub stage: HookStage,
    /// The command that was run
    pub command: String,
    /// Whether execution succeeded
    pub success: bool,
    /// Exit code if available
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Execution time in milliseconds
    pub duration_ms: u64,
}

/// Hook execution context
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Package name
    pub package_name: String,
    /// Package directory
    pub package_path: PathBuf,
    /// Version being released
    pub version: Option<String>,
    /// Version before the release
    pub previous_version: String,
    /// Git tag
    pub tag: Option<String>,
}

impl HookContext {
    /// Build a context for a package
    pub fn from_package(pkg: &PackageContext) -> Self {
        Self {
            package_name: pkg.name.clone(),
            package_path: pkg.path.clone(),
            version: pkg.new_version.clone(),
            previous_version: pkg.current_version.clone(),
            tag: None,
        }
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Convert context to environment variables
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("LIFTOFF_PACKAGE".to_string(), self.package_name.clone());
        env.insert(
            "LIFTOFF_PACKAGE_PATH".to_string(),
            self.package_path.to_string_lossy().to_string(),
        );
        env.insert(
            "LIFTOFF_PREVIOUS_VERSION".to_string(),
            self.previous_version.clone(),
        );
        if let Some(ref v) = self.version {
            env.insert("LIFTOFF_VERSION".to_string(), v.clone());
        }
        if let Some(ref v) = self.tag {
            env.insert("LIFTOFF_TAG".to_string(), v.clone());
        }

        env
    }
}

/// Hook runner for executing hooks at lifecycle stages
#[derive(Debug, Clone, Default)]
pub struct HookRunner {
    /// Registered commands by stage
    hooks: HashMap<HookStage, Vec<String>>,
    /// Working directory for commands
    base_dir: Option<PathBuf>,
}

impl HookRunner {
    /// Create a new hook runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a runner from configuration, running commands in `base_dir`
    pub fn from_config(config: &HooksConfig, base_dir: &Path) -> Self {
        let mut runner = Self::new().with_base_dir(base_dir);
        for stage in HookStage::all() {
            for command in config.commands(*stage) {
                runner.register(*stage, command.clone());
            }
        }
        runner
    }

    /// Set the base directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Register a command for a stage
    pub fn register(&mut self, stage: HookStage, command: impl Into<String>) {
        self.hooks.entry(stage).or_default().push(command.into());
    }

    /// Check if there are any hooks for a stage
    pub fn has_hooks(&self, stage: HookStage) -> bool {
        self.hooks.get(&stage).is_some_and(|v| !v.is_empty())
    }

    /// Execute all hooks for a stage, stopping at the first failure
    pub fn run(&self, stage: HookStage, context: &HookContext) -> Result<Vec<HookResult>> {
        let Some(commands) = self.hooks.get(&stage) else {
            return Ok(Vec::new());
        };

        info!(
            stage = stage.as_str(),
            package = %context.package_name,
            count = commands.len(),
            "running hooks"
        );
        let context_env = context.to_env();
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.execute(stage, command, &context_env)?;
            if !result.success {
                warn!(
                    stage = stage.as_str(),
                    command = %command,
                    exit_code = ?result.exit_code,
                    "hook failed"
                );
                let stderr = result.stderr.trim();
                return Err(WorkflowError::HookFailed {
                    stage: stage.as_str().to_string(),
                    command: command.clone(),
                    reason: if stderr.is_empty() {
                        format!("exited with {:?}", result.exit_code)
                    } else {
                        stderr.to_string()
                    },
                }
                .into());
            }
            results.push(result);
        }

        Ok(results)
    }

    fn execute(
        &self,
        stage: HookStage,
        command: &str,
        context_env: &HashMap<String, String>,
    ) -> Result<HookResult> {
        let start = std::time::Instant::now();

        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg).arg(command);

        if let Some(dir) = &self.base_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(context_env);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().map_err(|e| WorkflowError::HookFailed {
            stage: stage.as_str().to_string(),
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(stage = stage.as_str(), command, duration_ms, "hook finished");

        Ok(HookResult {
            stage,
            command: command.to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }
}
