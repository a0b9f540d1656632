//! Frontend task handlers.
//!
//! Each handler runs one task command in the guest's frontend mount, as the
//! unprivileged user under a login shell so the node version manager is on
//! the PATH. Exactly one frontend handler runs per provisioning pass.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::process::Cmd;
use crate::relay::Action;
use crate::watch::{self, WatchOutcome};

/// Install frontend dependencies.
pub const INSTALL_CMD: &str = "yarn install";
/// One-time frontend bootstrap (toolchain + dependencies + initial build).
pub const BOOTSTRAP_CMD: &str = "script/bootstrap";
/// One-shot unoptimized development build.
pub const DEV_CMD: &str = "yarn run build-dev";
/// Long-lived incremental build watcher.
pub const WATCH_CMD: &str = "yarn run watch";
/// Frontend test suite.
pub const TEST_CMD: &str = "yarn run test";
/// Production build.
pub const BUILD_CMD: &str = "yarn run build";

/// package.json scripts the task commands above rely on.
pub const REQUIRED_SCRIPTS: [&str; 4] = ["build-dev", "watch", "test", "build"];

/// Directory (relative to the frontend root) the production build lands in.
const BUILD_OUTPUT_DIR: &str = "build";

/// Run the handler for one frontend action.
pub fn run_action(config: &Config, action: Action) -> Result<()> {
    match action {
        Action::UiSetup => run_task(config, INSTALL_CMD, "Installing frontend dependencies"),
        Action::UiBootstrap => run_task(config, BOOTSTRAP_CMD, "Bootstrapping frontend"),
        Action::UiDev => run_task(config, DEV_CMD, "Building frontend (development)"),
        Action::UiDevWatch => run_watch(config),
        Action::UiTest => run_task(config, TEST_CMD, "Running frontend tests"),
        Action::UiBuild => {
            run_task(config, BUILD_CMD, "Building frontend")?;
            report_build_size(config);
            Ok(())
        }
        Action::Restart | Action::Tests => {
            bail!("'{}' is not a frontend action", action)
        }
    }
}

/// The login-shell script for one task command.
pub fn task_script(config: &Config, command: &str) -> String {
    format!("cd {} && {}", config.guest_frontend_dir.display(), command)
}

fn run_task(config: &Config, command: &str, label: &str) -> Result<()> {
    println!("{}...", label);
    Cmd::new("sudo")
        .args(["-H", "-u", config.service_user.as_str(), "bash", "-lc"])
        .arg(task_script(config, command))
        .error_msg(format!("Frontend task '{}' failed", command))
        .run_interactive()?;
    Ok(())
}

/// Block on the frontend watcher until it exits or an interrupt arrives.
/// On interrupt the watcher is terminated by process name.
fn run_watch(config: &Config) -> Result<()> {
    println!("Starting frontend watcher (Ctrl-C to stop)...");

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let mut cmd = tokio::process::Command::new("sudo");
        cmd.args(["-H", "-u", config.service_user.as_str(), "bash", "-lc"])
            .arg(task_script(config, WATCH_CMD));

        watch::run_until_interrupt(cmd, || {
            println!("Stopping frontend watcher...");
            if let Err(e) = watch::terminate_by_name(&config.watcher_process) {
                eprintln!("  [WARN] Failed to stop watcher: {}", e);
            }
        })
        .await
    })?;

    match outcome {
        WatchOutcome::Exited(status) if !status.success() => bail!(
            "Frontend watcher failed (exit code {})",
            status.code().unwrap_or(-1)
        ),
        _ => Ok(()),
    }
}

/// Report the size of the production build output.
fn report_build_size(config: &Config) {
    let output_dir = config.guest_frontend_dir.join(BUILD_OUTPUT_DIR);
    if !output_dir.is_dir() {
        println!("  Build output not found at {}", output_dir.display());
        return;
    }

    let mut files = 0u64;
    let mut bytes = 0u64;
    for entry in walkdir::WalkDir::new(&output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            files += 1;
            if let Ok(meta) = entry.metadata() {
                bytes += meta.len();
            }
        }
    }

    println!(
        "  Built {} files ({:.1} MB) in {}",
        files,
        bytes as f64 / (1024.0 * 1024.0),
        output_dir.display()
    );
}
