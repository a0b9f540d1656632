//! Tests for the guest-side provisioning entry.
//!
//! The full guest pass shells out to the package and service managers, so
//! these cover the parts that run before any external tool: the hostname
//! gate and the setup staleness decision.

mod helpers;

use helpers::{assert_flag_file, TestEnv};

use hadev::provision::{self, setup};

#[test]
fn test_provision_is_a_noop_on_unrecognized_host() {
    let env = TestEnv::new();
    // provision_hosts is "hadev-test-host", which no real machine is named.
    let config = env.config("true");
    let store = env.store();
    store.raise(hadev::relay::Action::Tests).unwrap();

    provision::cmd_provision(&config).unwrap();

    // Nothing was consumed, nothing was set up: the entry refused to treat
    // this machine as a provisioning target and exited successfully.
    assert_flag_file(&env.share_dir, "run_tests");
    assert!(!store.setup_done());
}

#[test]
fn test_setup_is_stale_until_marked_with_current_inputs() {
    let env = TestEnv::new();
    let config = env.config("true");
    let store = env.store();

    assert!(setup::is_stale(&config, &store).unwrap());

    let fingerprint = setup::current_fingerprint(&config, &config.requirements_manifest());
    store.mark_setup_done(&fingerprint).unwrap();
    assert!(!setup::is_stale(&config, &store).unwrap());
}

#[test]
fn test_requirements_change_restales_setup() {
    let env = TestEnv::new();
    let config = env.config("true");
    let store = env.store();

    let fingerprint = setup::current_fingerprint(&config, &config.requirements_manifest());
    store.mark_setup_done(&fingerprint).unwrap();
    assert!(!setup::is_stale(&config, &store).unwrap());

    std::fs::write(config.requirements_manifest(), "aiohttp==3.9\n").unwrap();
    assert!(setup::is_stale(&config, &store).unwrap());
}

#[test]
fn test_empty_setup_marker_counts_as_stale() {
    let env = TestEnv::new();
    let config = env.config("true");
    let store = env.store();

    // A marker written by hand (or by an older tool) with no fingerprint.
    std::fs::write(env.share_dir.join("setup_done"), "").unwrap();

    assert!(store.setup_done());
    assert!(setup::is_stale(&config, &store).unwrap());
}
