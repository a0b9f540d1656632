//! Server actions relayed to the guest: raise a flag, trigger a
//! provisioning pass, exit when the pass returns.

use anyhow::Result;

use crate::config::Config;
use crate::relay::{Action, FlagStore};
use crate::vm::VmTool;

/// Run the server test suite inside the VM.
pub fn cmd_tests(config: &Config) -> Result<()> {
    relay_action(config, Action::Tests)
}

/// Restart the managed service inside the VM.
pub fn cmd_restart(config: &Config) -> Result<()> {
    relay_action(config, Action::Restart)
}

fn relay_action(config: &Config, action: Action) -> Result<()> {
    FlagStore::new(&config.share_dir).raise(action)?;
    VmTool::from_config(config).provision()
}
