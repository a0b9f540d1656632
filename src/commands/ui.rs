//! Frontend actions relayed to the guest.
//!
//! All of these require the local frontend checkout to exist; the check runs
//! before any flag is raised or VM call made. `dev-watch` wraps the blocking
//! provisioning call in a cancellation handler, because the watcher it
//! starts lives on the guest and must be terminated across the VM boundary.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::relay::{Action, FlagStore};
use crate::vm::VmTool;
use crate::watch::{self, WatchOutcome};

/// Relay one frontend action to the guest.
pub fn cmd_ui(config: &Config, action: Action) -> Result<()> {
    ensure_frontend_repo(config)?;

    FlagStore::new(&config.share_dir).raise(action)?;

    let vm = VmTool::from_config(config);
    if action == Action::UiDevWatch {
        watch_provision(config, &vm)
    } else {
        vm.provision()
    }
}

/// Precondition for every frontend action: the local checkout must exist.
/// No side effects happen before this check.
pub fn ensure_frontend_repo(config: &Config) -> Result<()> {
    if !config.frontend_repo.is_dir() {
        bail!(
            "Frontend repository not found at {}.\n\
             Clone the web frontend next to this checkout, or point \
             HADEV_FRONTEND_REPO at it, before running ui commands.",
            config.frontend_repo.display()
        );
    }
    Ok(())
}

/// Run the provisioning pass under an interrupt handler. On SIGINT/SIGTERM
/// the guest-side watcher is killed through the VM tool's ssh facility
/// before the local provisioning child is torn down.
fn watch_provision(config: &Config, vm: &VmTool) -> Result<()> {
    println!("Starting watch mode (Ctrl-C to stop)...");

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let mut cmd = tokio::process::Command::new(vm.program());
        cmd.arg("provision").current_dir(vm.work_dir());

        watch::run_until_interrupt(cmd, || {
            println!("Stopping frontend watcher in the VM...");
            let kill = watch::remote_kill_command(&config.watcher_process);
            if let Err(e) = vm.ssh_exec(&kill) {
                eprintln!("  [WARN] Failed to stop remote watcher: {}", e);
            }
        })
        .await
    })?;

    match outcome {
        WatchOutcome::Exited(status) if !status.success() => bail!(
            "VM provisioning failed (exit code {})",
            status.code().unwrap_or(-1)
        ),
        _ => Ok(()),
    }
}
