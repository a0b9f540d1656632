//! Preflight checks for the host environment.
//!
//! Validates the VM tool and local checkouts before driving the VM.
//! Run with `hadev preflight` to check everything is ready.

use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::config::Config;
use crate::provision::ui;

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - provisioning will fail.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: None,
        }
    }

    fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Returns true if all checks passed (no failures).
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    /// Count of failed checks.
    pub fn fail_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("=== Preflight Check Results ===\n");

        for check in &self.checks {
            let icon = match check.status {
                CheckStatus::Pass => "✓",
                CheckStatus::Fail => "✗",
                CheckStatus::Warn => "⚠",
            };

            let status_str = match check.status {
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
                CheckStatus::Warn => "WARN",
            };

            print!("  {} [{}] {}", icon, status_str, check.name);
            if let Some(details) = &check.details {
                println!(": {}", details);
            } else {
                println!();
            }
        }

        println!();
        let failed = self.fail_count();
        if failed == 0 {
            println!("All checks passed.");
        } else {
            println!("{} check(s) failed.", failed);
        }
    }
}

/// Frontend package manifest, as far as preflight cares about it.
#[derive(Debug, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub scripts: HashMap<String, String>,
}

/// Run all preflight checks and collect a report.
pub fn run_preflight(config: &Config) -> Result<PreflightReport> {
    let mut checks = Vec::new();

    // VM tool on PATH
    match which::which(&config.vm_program) {
        Ok(path) => checks.push(CheckResult::pass_with(
            "VM tool",
            &path.display().to_string(),
        )),
        Err(_) => checks.push(CheckResult::fail(
            "VM tool",
            &format!("'{}' not found in PATH", config.vm_program),
        )),
    }

    // VM definition next to the tool's working directory
    let vagrantfile = config.base_dir.join("Vagrantfile");
    if vagrantfile.is_file() {
        checks.push(CheckResult::pass("VM definition"));
    } else {
        checks.push(CheckResult::warn(
            "VM definition",
            &format!("no Vagrantfile at {}", vagrantfile.display()),
        ));
    }

    // Shared provisioning directory must be writable
    checks.push(check_share_dir(config));

    // Frontend checkout (only needed for ui verbs)
    checks.push(check_frontend(config));

    Ok(PreflightReport { checks })
}

/// Run preflight and fail on the first problem (strict mode).
pub fn run_preflight_or_fail(config: &Config) -> Result<()> {
    let report = run_preflight(config)?;
    report.print();
    if !report.all_passed() {
        bail!("Preflight failed ({} check(s))", report.fail_count());
    }
    Ok(())
}

fn check_share_dir(config: &Config) -> CheckResult {
    if let Err(e) = fs::create_dir_all(&config.share_dir) {
        return CheckResult::fail(
            "Share directory",
            &format!("cannot create {}: {}", config.share_dir.display(), e),
        );
    }
    let probe = config.share_dir.join(".preflight_probe");
    match fs::write(&probe, b"") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            CheckResult::pass_with("Share directory", &config.share_dir.display().to_string())
        }
        Err(e) => CheckResult::fail(
            "Share directory",
            &format!("not writable ({}): {}", config.share_dir.display(), e),
        ),
    }
}

fn check_frontend(config: &Config) -> CheckResult {
    if !config.frontend_repo.is_dir() {
        return CheckResult::warn(
            "Frontend repo",
            &format!(
                "{} missing (ui commands will refuse to run)",
                config.frontend_repo.display()
            ),
        );
    }

    let manifest_path = config.frontend_repo.join("package.json");
    let content = match fs::read_to_string(&manifest_path) {
        Ok(c) => c,
        Err(_) => {
            return CheckResult::warn(
                "Frontend repo",
                &format!("no package.json at {}", manifest_path.display()),
            )
        }
    };

    let manifest: PackageManifest = match serde_json::from_str(&content) {
        Ok(m) => m,
        Err(e) => {
            return CheckResult::warn("Frontend repo", &format!("package.json unparseable: {}", e))
        }
    };

    let missing: Vec<&str> = ui::REQUIRED_SCRIPTS
        .iter()
        .filter(|s| !manifest.scripts.contains_key(**s))
        .copied()
        .collect();

    if missing.is_empty() {
        CheckResult::pass_with("Frontend repo", &config.frontend_repo.display().to_string())
    } else {
        CheckResult::warn(
            "Frontend repo",
            &format!("package.json missing scripts: {}", missing.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parses_scripts() {
        let manifest: PackageManifest = serde_json::from_str(
            r#"{"name": "frontend", "scripts": {"build": "gulp build", "watch": "gulp watch"}}"#,
        )
        .unwrap();

        assert_eq!(manifest.scripts.get("build").unwrap(), "gulp build");
        assert!(manifest.scripts.contains_key("watch"));
    }

    #[test]
    fn test_manifest_without_scripts_section() {
        let manifest: PackageManifest = serde_json::from_str(r#"{"name": "frontend"}"#).unwrap();
        assert!(manifest.scripts.is_empty());
    }

    #[test]
    fn test_report_counts_failures() {
        let report = PreflightReport {
            checks: vec![
                CheckResult::pass("a"),
                CheckResult::fail("b", "broken"),
                CheckResult::warn("c", "odd"),
            ],
        };

        assert!(!report.all_passed());
        assert_eq!(report.fail_count(), 1);
    }
}
