//! Installed dependency tree verification

use std::sync::Arc;

use tracing::{info, warn};

use liftoff_adapters::PackageRegistry;
use liftoff_core::config::PackageManager;
use liftoff_core::error::{Result, WorkflowError};

/// Checks that installing would leave the lockfile untouched
pub struct IntegrityChecker {
    registry: Arc<dyn PackageRegistry>,
}

impl IntegrityChecker {
    pub fn new(registry: Arc<dyn PackageRegistry>) -> Self {
        Self { registry }
    }

    /// Fail with `IntegrityCheckFailed` when manifests and lockfile disagree
    pub fn check(&self) -> Result<()> {
        let manager = self.registry.kind();
        if self.registry.check_workspace_integrity() {
            info!(package_manager = %manager, "workspace integrity verified");
            return Ok(());
        }

        warn!(package_manager = %manager, "workspace integrity check failed");
        Err(WorkflowError::IntegrityCheckFailed {
            remediation: remediation(manager).to_string(),
        }
        .into())
    }
}

fn remediation(manager: PackageManager) -> &'static str {
    match manager {
        PackageManager::Npm => "Run `npm install` and commit the updated package-lock.json",
        PackageManager::Yarn => "Run `yarn install` and commit the updated yarn.lock",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRegistry;
    use liftoff_core::LiftoffError;

    #[test]
    fn test_check() {
        assert!(IntegrityChecker::new(Arc::new(MockRegistry::default())).check().is_ok());

        let err = IntegrityChecker::new(Arc::new(MockRegistry::failing("check_workspace_integrity")))
            .check()
            .unwrap_err();
        match err {
            LiftoffError::Workflow(WorkflowError::IntegrityCheckFailed { remediation }) => {
                assert!(remediation.contains("npm install"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
