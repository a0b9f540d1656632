//! Server test suite handler.
//!
//! The harness's own exit status is deliberately swallowed: a red test run
//! is a result, not a broken provisioning pipeline, and must not abort the
//! enclosing pass or surface as a provisioning failure on the host.

use anyhow::Result;

use crate::config::Config;
use crate::process::Cmd;

/// Run the server test suite inside the venv.
pub fn run_test_suite(config: &Config) -> Result<()> {
    println!("Running server test suite...");

    let python = config.venv_dir.join("bin/python");
    let status = Cmd::new(python.to_string_lossy())
        .args(["-m", "pytest"])
        .dir(&config.guest_source_dir)
        .allow_fail()
        .run_interactive()?;

    if status.success() {
        println!("Test suite passed.");
    } else {
        println!(
            "Test suite failed (exit code {}). Provisioning continues.",
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}
