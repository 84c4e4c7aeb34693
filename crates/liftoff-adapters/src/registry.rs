//! Registry gateway selection

use std::path::Path;
use std::sync::Arc;

use liftoff_core::config::PackageManager;

use crate::npm::NpmRegistry;
use crate::runner::{CommandRunner, SystemCommandRunner};
use crate::traits::PackageRegistry;
use crate::yarn::YarnRegistry;

/// Gateway for the configured package manager
pub fn registry_for(manager: PackageManager, root: &Path) -> Arc<dyn PackageRegistry> {
    registry_with_runner(manager, root, Arc::new(SystemCommandRunner))
}

/// Gateway for the configured package manager, running commands through `runner`
pub fn registry_with_runner(
    manager: PackageManager,
    root: &Path,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn PackageRegistry> {
    match manager {
        PackageManager::Npm => Arc::new(NpmRegistry::with_runner(root, runner)),
        PackageManager::Yarn => Arc::new(YarnRegistry::with_runner(root, runner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::testing::RecordingRunner;
    use liftoff_core::config::NpmConfig;
    use tempfile::TempDir;

    #[test]
    fn test_registry_for_kind() {
        let temp = TempDir::new().unwrap();
        assert_eq!(registry_for(PackageManager::Npm, temp.path()).kind(), PackageManager::Npm);
        assert_eq!(registry_for(PackageManager::Yarn, temp.path()).kind(), PackageManager::Yarn);
    }

    #[test]
    fn test_commands_run_in_root() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(|_| CommandOutput::ok("ci-bot")));
        let registry = registry_with_runner(PackageManager::Npm, temp.path(), runner.clone());

        registry.validate_auth(&NpmConfig::default()).unwrap();
        assert_eq!(runner.specs()[0].cwd, temp.path());
    }
}
