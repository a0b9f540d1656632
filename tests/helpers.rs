//! Shared test utilities for hadev tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use hadev::config::Config;
use hadev::relay::FlagStore;

/// Test environment with temporary directories for the project checkout,
/// the shared provisioning directory, and the frontend checkout.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Project base directory (simulated server checkout)
    pub base_dir: PathBuf,
    /// Shared provisioning directory (both sides' view in tests)
    pub share_dir: PathBuf,
    /// Frontend checkout location (not created by default)
    pub frontend_repo: PathBuf,
}

impl TestEnv {
    /// Create a new test environment. The frontend checkout is absent until
    /// [`TestEnv::create_frontend_repo`] is called.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let base_dir = base.join("server");
        let share_dir = base_dir.join("provision");
        let frontend_repo = base.join("frontend");

        fs::create_dir_all(&base_dir).expect("Failed to create base dir");
        fs::create_dir_all(&share_dir).expect("Failed to create share dir");

        Self {
            _temp_dir: temp_dir,
            base_dir,
            share_dir,
            frontend_repo,
        }
    }

    /// Create the mock frontend checkout with a minimal package.json.
    pub fn create_frontend_repo(&self) {
        fs::create_dir_all(&self.frontend_repo).expect("Failed to create frontend repo");
        fs::write(
            self.frontend_repo.join("package.json"),
            r#"{
  "name": "frontend",
  "scripts": {
    "build-dev": "gulp build-dev",
    "watch": "gulp watch",
    "test": "gulp test",
    "build": "gulp build"
  }
}
"#,
        )
        .expect("Failed to write package.json");
    }

    /// Config wired to this environment, with the VM tool stubbed out.
    ///
    /// `vm_program` is typically `true` (a VM tool call that always
    /// succeeds) or `false` (a call that fails if it happens at all).
    pub fn config(&self, vm_program: &str) -> Config {
        Config {
            base_dir: self.base_dir.clone(),
            vm_program: vm_program.to_string(),
            share_dir: self.share_dir.clone(),
            // Tests see both sides of the share as the same directory,
            // exactly like the real synced folder does.
            guest_share_dir: self.share_dir.clone(),
            guest_source_dir: self.base_dir.clone(),
            venv_dir: self.base_dir.join("venv"),
            service_name: "homeautomation".to_string(),
            service_user: "vagrant".to_string(),
            frontend_repo: self.frontend_repo.clone(),
            guest_frontend_dir: self.frontend_repo.clone(),
            watcher_process: "gulp".to_string(),
            provision_hosts: vec!["hadev-test-host".to_string()],
        }
    }

    /// Flag store over this environment's share directory.
    pub fn store(&self) -> FlagStore {
        FlagStore::new(&self.share_dir)
    }
}

/// Assert that a flag file exists in the share directory.
#[allow(dead_code)]
pub fn assert_flag_file(share_dir: &Path, name: &str) {
    assert!(
        share_dir.join(name).is_file(),
        "Expected flag file '{}' in {}",
        name,
        share_dir.display()
    );
}

/// Assert that a flag file does not exist in the share directory.
#[allow(dead_code)]
pub fn assert_no_flag_file(share_dir: &Path, name: &str) {
    assert!(
        !share_dir.join(name).exists(),
        "Did not expect flag file '{}' in {}",
        name,
        share_dir.display()
    );
}
