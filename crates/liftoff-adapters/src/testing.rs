//! Command runner double for registry tests

use std::path::PathBuf;
use std::sync::Mutex;

use liftoff_core::error::AdapterError;

use crate::archive::write_test_tarball;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

type Responder = Box<dyn Fn(&CommandSpec) -> CommandOutput + Send + Sync>;

/// Records every command and answers with a canned response
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    respond: Responder,
}

impl RecordingRunner {
    pub fn new(respond: impl Fn(&CommandSpec) -> CommandOutput + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Answers pack commands by writing a real tarball.
    ///
    /// `npm pack` writes `npm_filename` in its working directory and prints
    /// it; `yarn pack --out PATH` writes PATH. Everything else succeeds.
    pub fn packing(npm_filename: &str) -> Self {
        let npm_filename = npm_filename.to_string();
        Self::new(move |spec| {
            let target = if spec.is("npm", "pack") {
                Some(spec.cwd.join(&npm_filename))
            } else if spec.is("yarn", "pack") {
                spec.args
                    .iter()
                    .position(|a| a == "--out")
                    .and_then(|i| spec.args.get(i + 1))
                    .map(|out| spec.cwd.join(PathBuf::from(out)))
            } else {
                None
            };

            match target {
                Some(path) => {
                    write_test_tarball(
                        &path,
                        &[("package.json", "{}"), ("README.md", "# pkg\n")],
                    );
                    CommandOutput::ok(format!("{}\n", npm_filename))
                }
                None => CommandOutput::ok(""),
            }
        })
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines
    pub fn commands(&self) -> Vec<String> {
        self.specs().iter().map(CommandSpec::display).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, AdapterError> {
        self.calls.lock().unwrap().push(spec.clone());
        Ok((self.respond)(spec))
    }
}
