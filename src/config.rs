//! Configuration management for hadev.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.
//!
//! The share directory paths are the wire protocol between the host and
//! guest invocations: both sides must agree on them for flag files to be
//! seen across the VM boundary.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default VM tool program.
pub const DEFAULT_VM_PROGRAM: &str = "vagrant";

/// Default managed service name.
pub const DEFAULT_SERVICE: &str = "homeautomation";

/// hadev configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project base directory (where the Vagrantfile lives).
    pub base_dir: PathBuf,
    /// VM tool program name (default: vagrant).
    pub vm_program: String,
    /// Host side of the shared provisioning directory (default: base/provision).
    pub share_dir: PathBuf,
    /// Guest mount of the same directory (default: /vagrant/provision).
    pub guest_share_dir: PathBuf,
    /// Guest mount of the server source checkout (default: /vagrant).
    pub guest_source_dir: PathBuf,
    /// Virtualenv directory inside the guest (default: /srv/homeautomation).
    pub venv_dir: PathBuf,
    /// Managed service name, also the venv binary name (default: homeautomation).
    pub service_name: String,
    /// Unprivileged user the service and frontend tasks run as (default: vagrant).
    pub service_user: String,
    /// Local frontend repository checkout (default: base/../frontend).
    pub frontend_repo: PathBuf,
    /// Guest mount of the frontend checkout (default: /frontend).
    pub guest_frontend_dir: PathBuf,
    /// Process name of the frontend build watcher, for cancellation (default: gulp).
    pub watcher_process: String,
    /// Guest hostnames recognized as provisioning targets.
    pub provision_hosts: Vec<String>,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// Searches for .env in the base directory; process environment
    /// variables override it.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        // Try to load .env file
        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    // Skip comments and empty lines
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    // Parse KEY=value
                    if let Some((key, value)) = line.split_once('=') {
                        let key = key.trim();
                        let value = value.trim();
                        // Remove quotes if present
                        let value = value.trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let path_var = |key: &str, default: PathBuf| -> PathBuf {
            env_vars
                .get(key)
                .map(|s| resolve_path(s, base_dir))
                .unwrap_or(default)
        };

        let vm_program = env_vars
            .get("HADEV_VM_PROGRAM")
            .cloned()
            .unwrap_or_else(|| DEFAULT_VM_PROGRAM.to_string());

        let share_dir = path_var("HADEV_SHARE_DIR", base_dir.join("provision"));
        let guest_share_dir =
            path_var("HADEV_GUEST_SHARE_DIR", PathBuf::from("/vagrant/provision"));
        let guest_source_dir = path_var("HADEV_GUEST_SOURCE_DIR", PathBuf::from("/vagrant"));
        let venv_dir = path_var("HADEV_VENV_DIR", PathBuf::from("/srv/homeautomation"));

        let service_name = env_vars
            .get("HADEV_SERVICE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());

        let service_user = env_vars
            .get("HADEV_SERVICE_USER")
            .cloned()
            .unwrap_or_else(|| "vagrant".to_string());

        let frontend_repo = path_var("HADEV_FRONTEND_REPO", base_dir.join("../frontend"));
        let guest_frontend_dir =
            path_var("HADEV_GUEST_FRONTEND_DIR", PathBuf::from("/frontend"));

        let watcher_process = env_vars
            .get("HADEV_WATCHER_PROCESS")
            .cloned()
            .unwrap_or_else(|| "gulp".to_string());

        let provision_hosts = env_vars
            .get("HADEV_PROVISION_HOSTS")
            .map(|s| {
                s.split(',')
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec!["hadev-bookworm".to_string(), "hadev-bullseye".to_string()]
            });

        Self {
            base_dir: base_dir.to_path_buf(),
            vm_program,
            share_dir,
            guest_share_dir,
            guest_source_dir,
            venv_dir,
            service_name,
            service_user,
            frontend_repo,
            guest_frontend_dir,
            watcher_process,
            provision_hosts,
        }
    }

    /// Path of the server requirements manifest in the guest checkout.
    pub fn requirements_manifest(&self) -> PathBuf {
        self.guest_source_dir.join("requirements.txt")
    }

    /// Returns true if the given hostname is a recognized provisioning target.
    pub fn is_provision_host(&self, hostname: &str) -> bool {
        self.provision_hosts.iter().any(|h| h == hostname)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  HADEV_VM_PROGRAM: {}", self.vm_program);
        println!("  HADEV_SHARE_DIR: {}", self.share_dir.display());
        println!("  HADEV_GUEST_SHARE_DIR: {}", self.guest_share_dir.display());
        println!("  HADEV_GUEST_SOURCE_DIR: {}", self.guest_source_dir.display());
        println!("  HADEV_VENV_DIR: {}", self.venv_dir.display());
        println!("  HADEV_SERVICE: {}", self.service_name);
        println!("  HADEV_SERVICE_USER: {}", self.service_user);
        println!("  HADEV_FRONTEND_REPO: {}", self.frontend_repo.display());
        println!(
            "  HADEV_GUEST_FRONTEND_DIR: {}",
            self.guest_frontend_dir.display()
        );
        println!("  HADEV_WATCHER_PROCESS: {}", self.watcher_process);
        println!("  HADEV_PROVISION_HOSTS: {}", self.provision_hosts.join(","));
        if self.frontend_repo.is_dir() {
            println!("  Frontend repo: FOUND");
        } else {
            println!("  Frontend repo: NOT FOUND (ui commands will refuse to run)");
        }
    }
}

/// Resolve a configured path string: `~` expands to the home directory,
/// relative paths are anchored at the base directory.
fn resolve_path(value: &str, base_dir: &Path) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        std::env::remove_var("HADEV_VM_PROGRAM");
        std::env::remove_var("HADEV_SHARE_DIR");
        let base = Path::new("/work/server");
        let config = Config::load(base);

        assert_eq!(config.vm_program, "vagrant");
        assert_eq!(config.share_dir, Path::new("/work/server/provision"));
        assert_eq!(config.guest_share_dir, Path::new("/vagrant/provision"));
        assert_eq!(config.frontend_repo, Path::new("/work/server/../frontend"));
        assert_eq!(config.provision_hosts.len(), 2);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("HADEV_VM_PROGRAM", "true");
        std::env::set_var("HADEV_PROVISION_HOSTS", "alpha, beta");
        let config = Config::load(Path::new("/work/server"));
        std::env::remove_var("HADEV_VM_PROGRAM");
        std::env::remove_var("HADEV_PROVISION_HOSTS");

        assert_eq!(config.vm_program, "true");
        assert_eq!(config.provision_hosts, vec!["alpha", "beta"]);
        assert!(config.is_provision_host("beta"));
        assert!(!config.is_provision_host("gamma"));
    }

    #[test]
    #[serial]
    fn test_relative_share_dir_anchored_at_base() {
        std::env::set_var("HADEV_SHARE_DIR", "state/flags");
        let config = Config::load(Path::new("/work/server"));
        std::env::remove_var("HADEV_SHARE_DIR");

        assert_eq!(config.share_dir, Path::new("/work/server/state/flags"));
    }

    #[test]
    fn test_tilde_expansion() {
        let resolved = resolve_path("~/frontend", Path::new("/work"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolved, home.join("frontend"));
        }
    }
}
