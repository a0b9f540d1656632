//! First-time guest setup.
//!
//! Installs OS packages, creates the server virtualenv, installs the server
//! from the mounted checkout, writes and enables the systemd unit, and links
//! the service binary into the PATH. Runs once per VM; re-runs when the
//! setup marker is cleared (explicit `setup`/`recreate`) or when the
//! provisioning inputs changed behind an existing marker.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::process::Cmd;
use crate::relay::{self, FlagStore};

use super::service;

/// OS packages required by the server and its tooling.
const OS_PACKAGES: &[&str] = &[
    "python3",
    "python3-dev",
    "python3-venv",
    "python3-pip",
    "libssl-dev",
    "libffi-dev",
    "libudev-dev",
    "git",
];

/// Render the managed service's systemd unit.
pub fn render_unit(config: &Config) -> String {
    format!(
        r#"[Unit]
Description=Home automation server
After=network-online.target
Wants=network-online.target

[Service]
Type=simple
User={user}
ExecStart={venv}/bin/{service}
Restart=on-failure

[Install]
WantedBy=multi-user.target
"#,
        user = config.service_user,
        venv = config.venv_dir.display(),
        service = config.service_name,
    )
}

/// Fingerprint of the provisioning inputs: the requirements manifest plus
/// the rendered unit. A missing manifest hashes as empty so a later-added
/// manifest still triggers a re-run.
pub fn current_fingerprint(config: &Config, manifest: &Path) -> String {
    let manifest_bytes = fs::read(manifest).unwrap_or_default();
    relay::fingerprint(&[&manifest_bytes, render_unit(config).as_bytes()])
}

/// Whether setup needs to run: marker absent, or inputs changed since the
/// marker was written.
pub fn is_stale(config: &Config, store: &FlagStore) -> Result<bool> {
    if !store.setup_done() {
        return Ok(true);
    }
    let current = current_fingerprint(config, &config.requirements_manifest());
    Ok(store.setup_fingerprint().as_deref() != Some(current.as_str()))
}

/// Run first-time setup and write the setup marker. Any step failing is
/// fatal and leaves the marker absent, so the next pass retries setup.
pub fn run_setup(config: &Config, store: &FlagStore) -> Result<()> {
    println!("Running first-time setup...");

    install_packages()?;
    create_venv(config)?;
    install_server(config)?;
    install_unit(config)?;
    install_service_symlink(config)?;

    let fingerprint = current_fingerprint(config, &config.requirements_manifest());
    store.mark_setup_done(&fingerprint)?;
    println!("Setup complete.");
    Ok(())
}

fn install_packages() -> Result<()> {
    println!("Installing OS packages...");
    Cmd::new("apt-get")
        .arg("update")
        .env("DEBIAN_FRONTEND", "noninteractive")
        .error_msg("Package index update failed")
        .run_interactive()?;
    Cmd::new("apt-get")
        .args(["install", "-y"])
        .args(OS_PACKAGES)
        .env("DEBIAN_FRONTEND", "noninteractive")
        .error_msg("Package install failed")
        .run_interactive()?;
    Ok(())
}

fn venv_bin(config: &Config, name: &str) -> PathBuf {
    config.venv_dir.join("bin").join(name)
}

fn create_venv(config: &Config) -> Result<()> {
    let python = venv_bin(config, "python");
    if python.exists() {
        println!("Virtualenv already present at {}", config.venv_dir.display());
    } else {
        println!("Creating virtualenv at {}...", config.venv_dir.display());
        fs::create_dir_all(&config.venv_dir).with_context(|| {
            format!("Failed to create venv directory {}", config.venv_dir.display())
        })?;
        Cmd::new("python3")
            .args(["-m", "venv"])
            .arg(config.venv_dir.to_string_lossy())
            .error_msg("Virtualenv creation failed")
            .run_interactive()?;
    }

    Cmd::new(venv_bin(config, "pip").to_string_lossy())
        .args(["install", "--upgrade", "pip"])
        .error_msg("pip upgrade failed")
        .run_interactive()?;
    Ok(())
}

fn install_server(config: &Config) -> Result<()> {
    println!(
        "Installing server from {}...",
        config.guest_source_dir.display()
    );
    Cmd::new(venv_bin(config, "pip").to_string_lossy())
        .args(["install", "-e"])
        .arg(config.guest_source_dir.to_string_lossy())
        .error_msg("Server install failed")
        .run_interactive()?;

    // The test handler needs pytest inside the same venv.
    Cmd::new(venv_bin(config, "pip").to_string_lossy())
        .args(["install", "pytest"])
        .error_msg("Test harness install failed")
        .run_interactive()?;
    Ok(())
}

fn install_unit(config: &Config) -> Result<()> {
    let unit_path =
        PathBuf::from("/etc/systemd/system").join(format!("{}.service", config.service_name));
    println!("Writing service unit {}...", unit_path.display());
    fs::write(&unit_path, render_unit(config))
        .with_context(|| format!("Failed to write unit file {}", unit_path.display()))?;

    service::daemon_reload()?;
    service::enable_service(config)?;
    println!("  Enabled {}.service", config.service_name);
    Ok(())
}

fn install_service_symlink(config: &Config) -> Result<()> {
    let target = venv_bin(config, &config.service_name);
    let link = PathBuf::from("/usr/local/bin").join(&config.service_name);

    if link.exists() || link.is_symlink() {
        fs::remove_file(&link).ok();
    }
    std::os::unix::fs::symlink(&target, &link)
        .with_context(|| format!("Failed to link {} -> {}", link.display(), target.display()))?;

    println!("  Linked {} -> {}", link.display(), target.display());
    Ok(())
}
