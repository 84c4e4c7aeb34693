//! External command execution
//!
//! Registries never spawn processes directly; they describe the command as a
//! [`CommandSpec`] and hand it to a [`CommandRunner`].

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

use liftoff_core::error::AdapterError;

const SECRET_FLAG: &str = "--otp";
const MASK: &str = "***";

/// A command to run: program, arguments, working directory and extra environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a command run in `cwd`
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Whether the first argument is `subcommand`
    pub fn is(&self, program: &str, subcommand: &str) -> bool {
        self.program == program && self.args.first().is_some_and(|a| a == subcommand)
    }

    /// Command line as shown in errors and logs, with one-time passwords masked
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push(MASK.to_string());
                mask_next = false;
            } else if arg.strip_prefix(SECRET_FLAG).is_some_and(|rest| rest.starts_with('=')) {
                parts.push(format!("{}={}", SECRET_FLAG, MASK));
            } else {
                mask_next = arg == SECRET_FLAG;
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Error text to report: stderr, else stdout, else the exit code
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        if !stderr.is_empty() {
            stderr.to_string()
        } else if !stdout.is_empty() {
            stdout.to_string()
        } else {
            match self.code {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            }
        }
    }
}

/// Runs external commands to completion
pub trait CommandRunner: Send + Sync {
    /// Run the command and capture its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], not as
    /// an error; errors mean the process could not be started.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, AdapterError>;
}

/// Runs commands with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, AdapterError> {
        let start = std::time::Instant::now();
        let command = spec.display();

        // Resolves npm.cmd and friends on Windows as well
        let program = which::which(&spec.program).map_err(|e| AdapterError::CommandFailed {
            command: command.clone(),
            reason: format!("`{}` was not found on PATH: {}", spec.program, e),
        })?;

        let output = Command::new(&program)
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .current_dir(&spec.cwd)
            .output()
            .map_err(|e| AdapterError::CommandFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            command = %command,
            cwd = %spec.cwd.display(),
            duration_ms = start.elapsed().as_millis(),
            success = output.status.success(),
            "ran command"
        );

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Run `spec` and return stdout, turning a non-zero exit into `CommandFailed`
pub(crate) fn run_checked(runner: &dyn CommandRunner, spec: &CommandSpec) -> Result<String, AdapterError> {
    let output = runner.run(spec)?;
    if !output.success {
        let reason = output.failure_reason();
        warn!(command = %spec.display(), reason = %reason, "command failed");
        return Err(AdapterError::CommandFailed {
            command: spec.display(),
            reason,
        });
    }
    Ok(output.stdout)
}
