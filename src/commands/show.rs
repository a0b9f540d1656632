//! Show command - display configuration and relay status.

use anyhow::Result;

use crate::config::Config;
use crate::relay::FlagStore;
use crate::vm::VmTool;

/// What to show.
#[derive(Debug, Clone, Copy)]
pub enum ShowTarget {
    Config,
    Status,
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
            Ok(())
        }
        ShowTarget::Status => show_status(config),
    }
}

fn show_status(config: &Config) -> Result<()> {
    let store = FlagStore::new(&config.share_dir);

    println!("Relay status:");
    if store.setup_done() {
        println!("  Setup: done");
    } else {
        println!("  Setup: pending (next provisioning pass runs first-time setup)");
    }

    let pending = store.pending();
    if pending.is_empty() {
        println!("  Pending flags: none");
    } else {
        for action in pending {
            println!("  Pending flag: {}", action);
        }
    }

    match VmTool::from_config(config).status() {
        Ok(status) => {
            println!("VM status:");
            for line in status.lines() {
                println!("  {}", line);
            }
        }
        Err(e) => println!("VM status unavailable: {}", e),
    }

    Ok(())
}
