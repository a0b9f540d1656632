//! Managed service lifecycle via the service manager.
//!
//! The restart/start paths carry a custom diagnostic: if the service cannot
//! be (re)started the most likely cause is an incomplete or outdated setup,
//! and the fix is to re-run it.

use anyhow::Result;

use crate::config::Config;
use crate::process::Cmd;

/// Reload unit definitions after writing a unit file.
pub fn daemon_reload() -> Result<()> {
    Cmd::new("systemctl")
        .arg("daemon-reload")
        .error_msg("systemd daemon-reload failed")
        .run()?;
    Ok(())
}

/// Enable the managed service so it starts on boot.
pub fn enable_service(config: &Config) -> Result<()> {
    Cmd::new("systemctl")
        .args(["enable", config.service_name.as_str()])
        .error_msg(format!("Failed to enable '{}'", config.service_name))
        .run()?;
    Ok(())
}

/// Restart the managed service.
pub fn restart_service(config: &Config) -> Result<()> {
    println!("Restarting {}...", config.service_name);
    Cmd::new("systemctl")
        .args(["restart", config.service_name.as_str()])
        .error_msg(broken_setup_diagnostic("restart", config))
        .run()?;
    Ok(())
}

/// Start the managed service (no-op if already running).
pub fn start_service(config: &Config) -> Result<()> {
    println!("Starting {}...", config.service_name);
    Cmd::new("systemctl")
        .args(["start", config.service_name.as_str()])
        .error_msg(broken_setup_diagnostic("start", config))
        .run()?;
    Ok(())
}

fn broken_setup_diagnostic(verb: &str, config: &Config) -> String {
    format!(
        "Failed to {} '{}'. Setup may be broken; re-run 'hadev setup' from the host",
        verb, config.service_name
    )
}
