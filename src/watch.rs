//! Watch-mode cancellation.
//!
//! The frontend watch handlers block on a long-lived watcher process; the
//! only ways out are the watcher exiting on its own or an interrupt signal.
//! On interrupt the watcher is terminated by process name, best-effort: the
//! script may return before the target has fully torn down.

use anyhow::{bail, Context, Result};
use std::process::ExitStatus;
use tokio::process::Command;
use tokio::signal::unix::{signal, SignalKind};

use crate::process::Cmd;

/// How a watched foreground child ended.
#[derive(Debug)]
pub enum WatchOutcome {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// SIGINT/SIGTERM arrived; cleanup ran and the child was killed.
    Interrupted,
}

/// Run a foreground child until it exits or SIGINT/SIGTERM arrives.
///
/// On interrupt, `on_interrupt` runs first (so cleanup that must reach
/// across the VM boundary happens while the tool is still connected), then
/// the child is killed and reaped.
pub async fn run_until_interrupt<F>(mut cmd: Command, on_interrupt: F) -> Result<WatchOutcome>
where
    F: FnOnce(),
{
    let mut child = cmd.spawn().context("Failed to spawn watched command")?;

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    enum Event {
        Exited(std::io::Result<ExitStatus>),
        Signal,
    }

    let event = tokio::select! {
        status = child.wait() => Event::Exited(status),
        _ = sigint.recv() => Event::Signal,
        _ = sigterm.recv() => Event::Signal,
    };

    match event {
        Event::Exited(status) => {
            let status = status.context("Failed to wait for watched command")?;
            Ok(WatchOutcome::Exited(status))
        }
        Event::Signal => {
            on_interrupt();
            let _ = child.start_kill();
            let _ = child.wait().await;
            Ok(WatchOutcome::Interrupted)
        }
    }
}

/// Best-effort terminate processes matching `name` (`pkill -f`).
///
/// Returns true if at least one process was signalled. "No match" is not an
/// error; anything else from pkill is.
pub fn terminate_by_name(name: &str) -> Result<bool> {
    let result = Cmd::new("pkill").args(["-f", name]).allow_fail().run()?;
    match result.code() {
        0 => Ok(true),
        1 => Ok(false),
        code => bail!(
            "pkill -f '{}' failed (exit code {}): {}",
            name,
            code,
            result.stderr_trimmed()
        ),
    }
}

/// The remote form of [`terminate_by_name`], for the VM tool's ssh facility.
///
/// "No match" must not fail the remote invocation either.
pub fn remote_kill_command(name: &str) -> String {
    format!("pkill -f {} || true", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_by_name_no_match() {
        let killed = terminate_by_name("hadev_no_such_process_54321").unwrap();
        assert!(!killed);
    }

    #[test]
    fn test_remote_kill_command_swallows_no_match() {
        let cmd = remote_kill_command("gulp");
        assert!(cmd.starts_with("pkill -f gulp"));
        assert!(cmd.ends_with("|| true"));
    }

    #[test]
    fn test_run_until_interrupt_child_exit() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let outcome = rt
            .block_on(async {
                let mut cmd = Command::new("true");
                cmd.kill_on_drop(true);
                run_until_interrupt(cmd, || panic!("should not be interrupted")).await
            })
            .unwrap();

        match outcome {
            WatchOutcome::Exited(status) => assert!(status.success()),
            WatchOutcome::Interrupted => panic!("child should have exited"),
        }
    }
}
