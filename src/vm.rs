//! VM tool wrapper.
//!
//! The VM tool (vagrant by default) is an external collaborator: hadev only
//! ever drives its lifecycle entrypoints and remote-execution facility, it
//! never reimplements them. All calls stream output to the terminal and are
//! synchronous; a provisioning call does not return until the guest-side
//! pass, including flag consumption, has completed.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::process::Cmd;

/// Handle on the configured VM tool, bound to the project directory.
#[derive(Debug, Clone)]
pub struct VmTool {
    program: String,
    work_dir: PathBuf,
}

impl VmTool {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.vm_program.clone(),
            work_dir: config.base_dir.clone(),
        }
    }

    /// The underlying program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The directory the tool runs in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn cmd(&self) -> Cmd {
        Cmd::new(&self.program).dir(&self.work_dir)
    }

    /// Bring the VM up, optionally forcing a provisioning pass.
    pub fn up(&self, provision: bool) -> Result<()> {
        let mut cmd = self.cmd().arg("up");
        if provision {
            cmd = cmd.arg("--provision");
        }
        cmd.error_msg("VM bring-up failed").run_interactive()?;
        Ok(())
    }

    /// Re-run the provisioner against the running VM.
    pub fn provision(&self) -> Result<()> {
        self.cmd()
            .arg("provision")
            .error_msg("VM provisioning failed")
            .run_interactive()?;
        Ok(())
    }

    /// Halt the VM.
    pub fn halt(&self) -> Result<()> {
        self.cmd()
            .arg("halt")
            .error_msg("VM halt failed")
            .run_interactive()?;
        Ok(())
    }

    /// Destroy the VM without confirmation.
    pub fn destroy(&self) -> Result<()> {
        self.cmd()
            .args(["destroy", "--force"])
            .error_msg("VM destroy failed")
            .run_interactive()?;
        Ok(())
    }

    /// Execute a command inside the guest over the tool's ssh facility.
    pub fn ssh_exec(&self, command: &str) -> Result<()> {
        self.cmd()
            .args(["ssh", "-c", command])
            .error_msg("Remote command failed")
            .run_interactive()?;
        Ok(())
    }

    /// Current VM status, captured for display.
    pub fn status(&self) -> Result<String> {
        let result = self
            .cmd()
            .arg("status")
            .error_msg("VM status query failed")
            .run()?;
        Ok(result.stdout_trimmed().to_string())
    }
}
