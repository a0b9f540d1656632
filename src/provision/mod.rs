//! Guest-side provisioning dispatch.
//!
//! This is the entrypoint the VM tool's provisioner runs (the binary with no
//! subcommand). Inputs are the machine hostname and the presence of flag
//! files in the shared directory; there is no explicit verb.
//!
//! One pass: first-time setup if the setup marker is absent or stale,
//! otherwise drain raised flags in dispatch order. Frontend handlers end the
//! pass; everything else falls through to the default action of making sure
//! the managed service is running.

pub mod service;
pub mod setup;
pub mod testsuite;
pub mod ui;

use anyhow::Result;

use crate::config::Config;
use crate::process;
use crate::relay::{self, Action, FlagStore};

/// Execute one guest-side provisioning pass.
pub fn cmd_provision(config: &Config) -> Result<()> {
    let hostname = process::hostname()?;
    if !config.is_provision_host(&hostname) {
        // Not a provisioning target. This runs only inside recognized
        // machines; anywhere else it must not touch the system.
        print_usage(config, &hostname);
        return Ok(());
    }

    let store = FlagStore::new(&config.guest_share_dir);

    if setup::is_stale(config, &store)? {
        setup::run_setup(config, &store)?;
    } else {
        let pass_ended = relay::drain(&store, |action| handle(config, action))?;
        if pass_ended {
            return Ok(());
        }
    }

    // Default action: make sure the managed service is running.
    service::start_service(config)
}

fn handle(config: &Config, action: Action) -> Result<()> {
    match action {
        Action::Restart => service::restart_service(config),
        Action::Tests => testsuite::run_test_suite(config),
        Action::UiSetup
        | Action::UiBootstrap
        | Action::UiDev
        | Action::UiDevWatch
        | Action::UiTest
        | Action::UiBuild => ui::run_action(config, action),
    }
}

fn print_usage(config: &Config, hostname: &str) {
    println!(
        "hadev provisioner: '{}' is not a provisioning target (expected one of: {}).",
        hostname,
        config.provision_hosts.join(", ")
    );
    println!("Run 'hadev --help' on the host for the available commands.");
}
