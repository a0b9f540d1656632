//! Plain VM lifecycle passthrough - no flags involved.

use anyhow::Result;

use crate::config::Config;
use crate::vm::VmTool;

/// Bring the VM up without forcing a provisioning pass.
pub fn cmd_start(config: &Config) -> Result<()> {
    VmTool::from_config(config).up(false)
}

/// Halt the VM.
pub fn cmd_stop(config: &Config) -> Result<()> {
    VmTool::from_config(config).halt()
}

/// Destroy the VM.
pub fn cmd_destroy(config: &Config) -> Result<()> {
    VmTool::from_config(config).destroy()
}
