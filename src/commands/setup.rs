//! Setup and recreate commands.

use anyhow::Result;

use crate::config::Config;
use crate::provision;
use crate::relay::{Action, FlagStore};
use crate::vm::VmTool;

/// Execute the setup command: clear the setup marker so the guest pass runs
/// first-time setup, bring the VM up with provisioning, and record setup as
/// complete on success.
pub fn cmd_setup(config: &Config) -> Result<()> {
    let store = FlagStore::new(&config.share_dir);
    store.clear_setup_marker()?;

    VmTool::from_config(config).up(true)?;

    // The guest pass writes the marker through the shared mount. Record it
    // host-side as well in case the share was not mounted when setup ran.
    if !store.setup_done() {
        let fingerprint = provision::setup::current_fingerprint(
            config,
            &config.base_dir.join("requirements.txt"),
        );
        store.mark_setup_done(&fingerprint)?;
    }

    println!("Setup complete.");
    Ok(())
}

/// Execute the recreate command: drop the setup marker and any pending
/// restart, destroy the VM, and bring it back up with fresh provisioning.
pub fn cmd_recreate(config: &Config) -> Result<()> {
    let store = FlagStore::new(&config.share_dir);
    store.clear_setup_marker()?;
    store.clear(Action::Restart)?;

    let vm = VmTool::from_config(config);
    vm.destroy()?;
    vm.up(true)?;

    println!("VM recreated.");
    Ok(())
}
