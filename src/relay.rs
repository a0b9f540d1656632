//! Sentinel flag relay between the host and guest invocations.
//!
//! A host verb raises a zero-content flag file in the shared provisioning
//! directory, then triggers a provisioning pass; the guest-side dispatcher
//! consumes flags in a fixed priority order and runs the matching handler.
//! The file names are the wire protocol between the two sides and must stay
//! stable.
//!
//! Flags are one-shot: `consume` deletes the file before the handler runs,
//! so a crash mid-handler does not redeliver on the next pass. There is no
//! locking; correctness relies on the VM tool's provisioning step being
//! synchronous (the host does not proceed until the guest pass completes).

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One-shot actions a host verb can request from the guest dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Restart,
    Tests,
    UiSetup,
    UiBootstrap,
    UiDev,
    UiDevWatch,
    UiTest,
    UiBuild,
}

/// Guest-side dispatch order. Checked front to back within one pass.
pub const DISPATCH_ORDER: [Action; 8] = [
    Action::Restart,
    Action::Tests,
    Action::UiSetup,
    Action::UiBootstrap,
    Action::UiDev,
    Action::UiDevWatch,
    Action::UiTest,
    Action::UiBuild,
];

/// Marker recording that first-time setup completed. Holds the SHA-256
/// fingerprint of the provisioning inputs at the time setup ran.
pub const SETUP_MARKER: &str = "setup_done";

impl Action {
    /// Stable flag file name for this action.
    pub fn flag_name(self) -> &'static str {
        match self {
            Action::Restart => "restart",
            Action::Tests => "run_tests",
            Action::UiSetup => "run_ui_setup",
            Action::UiBootstrap => "run_ui_bootstrap",
            Action::UiDev => "run_ui_dev",
            Action::UiDevWatch => "run_ui_dev_watch",
            Action::UiTest => "run_ui_test",
            Action::UiBuild => "run_ui_build",
        }
    }

    /// Whether the guest pass ends immediately after this action's handler.
    ///
    /// Frontend handlers end the pass so at most one UI action runs per
    /// provisioning pass; restart and tests fall through to the default
    /// service (re)start.
    pub fn ends_pass(self) -> bool {
        !matches!(self, Action::Restart | Action::Tests)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// Flag file store rooted at one side's view of the shared directory.
#[derive(Debug, Clone)]
pub struct FlagStore {
    dir: PathBuf,
}

impl FlagStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn flag_path(&self, action: Action) -> PathBuf {
        self.dir.join(action.flag_name())
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(SETUP_MARKER)
    }

    /// Raise a flag (idempotent: re-raising an already-raised flag is a no-op).
    pub fn raise(&self, action: Action) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create flag directory {}", self.dir.display()))?;
        fs::write(self.flag_path(action), b"")
            .with_context(|| format!("Failed to raise flag '{}'", action))?;
        Ok(())
    }

    /// Returns true if the flag is currently raised.
    pub fn is_raised(&self, action: Action) -> bool {
        self.flag_path(action).exists()
    }

    /// Test-and-clear: remove the flag, returning whether it was raised.
    ///
    /// The file is deleted before the caller's handler runs.
    pub fn consume(&self, action: Action) -> Result<bool> {
        match fs::remove_file(self.flag_path(action)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to consume flag '{}'", action))
            }
        }
    }

    /// Clear a flag if raised.
    pub fn clear(&self, action: Action) -> Result<()> {
        self.consume(action)?;
        Ok(())
    }

    /// All currently raised flags, in dispatch order.
    pub fn pending(&self) -> Vec<Action> {
        DISPATCH_ORDER
            .into_iter()
            .filter(|a| self.is_raised(*a))
            .collect()
    }

    /// Returns true if first-time setup has completed.
    pub fn setup_done(&self) -> bool {
        self.marker_path().exists()
    }

    /// The fingerprint stored in the setup marker, if any.
    pub fn setup_fingerprint(&self) -> Option<String> {
        let content = fs::read_to_string(self.marker_path()).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Record that setup completed for the given provisioning inputs.
    pub fn mark_setup_done(&self, fingerprint: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create flag directory {}", self.dir.display()))?;
        fs::write(self.marker_path(), fingerprint)
            .context("Failed to write setup marker")?;
        Ok(())
    }

    /// Clear the setup marker so the next provisioning pass re-runs setup.
    pub fn clear_setup_marker(&self) -> Result<()> {
        match fs::remove_file(self.marker_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to clear setup marker"),
        }
    }
}

/// Drain raised flags in dispatch order, invoking the handler for each.
///
/// Returns true if the pass was ended by a handler whose action terminates
/// the pass (the frontend actions). A handler error aborts the drain; its
/// flag has already been consumed.
pub fn drain<F>(store: &FlagStore, mut handle: F) -> Result<bool>
where
    F: FnMut(Action) -> Result<()>,
{
    for action in DISPATCH_ORDER {
        if store.consume(action)? {
            handle(action)?;
            if action.ends_pass() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// SHA-256 fingerprint of the provisioning inputs, hex-encoded.
///
/// Used to detect changed inputs (requirements manifest, rendered unit)
/// behind an existing setup marker.
pub fn fingerprint(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FlagStore) {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let store = FlagStore::new(tmp.path().join("provision"));
        (tmp, store)
    }

    #[test]
    fn test_raise_is_idempotent() {
        let (_tmp, store) = store();
        store.raise(Action::Tests).unwrap();
        store.raise(Action::Tests).unwrap();

        assert!(store.is_raised(Action::Tests));
        assert_eq!(store.pending(), vec![Action::Tests]);
    }

    #[test]
    fn test_consume_is_one_shot() {
        let (_tmp, store) = store();
        store.raise(Action::Tests).unwrap();

        assert!(store.consume(Action::Tests).unwrap());
        assert!(!store.consume(Action::Tests).unwrap());
        assert!(!store.is_raised(Action::Tests));
    }

    #[test]
    fn test_pending_in_dispatch_order() {
        let (_tmp, store) = store();
        store.raise(Action::UiBuild).unwrap();
        store.raise(Action::Restart).unwrap();
        store.raise(Action::UiDev).unwrap();

        assert_eq!(
            store.pending(),
            vec![Action::Restart, Action::UiDev, Action::UiBuild]
        );
    }

    #[test]
    fn test_drain_runs_handlers_in_order_and_consumes() {
        let (_tmp, store) = store();
        store.raise(Action::Tests).unwrap();
        store.raise(Action::Restart).unwrap();

        let mut seen = Vec::new();
        let ended = drain(&store, |action| {
            seen.push(action);
            Ok(())
        })
        .unwrap();

        assert!(!ended);
        assert_eq!(seen, vec![Action::Restart, Action::Tests]);
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_drain_stops_after_first_ui_action() {
        let (_tmp, store) = store();
        store.raise(Action::UiSetup).unwrap();
        store.raise(Action::UiBuild).unwrap();

        let mut seen = Vec::new();
        let ended = drain(&store, |action| {
            seen.push(action);
            Ok(())
        })
        .unwrap();

        // Only the highest-priority UI action runs; the other stays raised
        // for the next provisioning pass.
        assert!(ended);
        assert_eq!(seen, vec![Action::UiSetup]);
        assert!(store.is_raised(Action::UiBuild));
    }

    #[test]
    fn test_drain_restart_continues_past_ui_boundary() {
        let (_tmp, store) = store();
        store.raise(Action::Restart).unwrap();
        store.raise(Action::UiTest).unwrap();

        let mut seen = Vec::new();
        let ended = drain(&store, |action| {
            seen.push(action);
            Ok(())
        })
        .unwrap();

        assert!(ended);
        assert_eq!(seen, vec![Action::Restart, Action::UiTest]);
    }

    #[test]
    fn test_flag_consumed_even_if_handler_fails() {
        let (_tmp, store) = store();
        store.raise(Action::Tests).unwrap();

        let result = drain(&store, |_| anyhow::bail!("handler exploded"));

        assert!(result.is_err());
        assert!(!store.is_raised(Action::Tests));
    }

    #[test]
    fn test_setup_marker_roundtrip() {
        let (_tmp, store) = store();
        assert!(!store.setup_done());

        let print = fingerprint(&[b"requirements", b"unit"]);
        store.mark_setup_done(&print).unwrap();
        assert!(store.setup_done());
        assert_eq!(store.setup_fingerprint().as_deref(), Some(print.as_str()));

        store.clear_setup_marker().unwrap();
        assert!(!store.setup_done());
        // Clearing twice is fine.
        store.clear_setup_marker().unwrap();
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let a = fingerprint(&[b"one", b"two"]);
        let b = fingerprint(&[b"one", b"three"]);
        assert_ne!(a, b);
        assert_eq!(a, fingerprint(&[b"one", b"two"]));
    }

    #[test]
    fn test_flag_names_are_wire_stable() {
        let names: Vec<&str> = DISPATCH_ORDER.iter().map(|a| a.flag_name()).collect();
        assert_eq!(
            names,
            vec![
                "restart",
                "run_tests",
                "run_ui_setup",
                "run_ui_bootstrap",
                "run_ui_dev",
                "run_ui_dev_watch",
                "run_ui_test",
                "run_ui_build",
            ]
        );
    }
}
