//! Host-side CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `setup` - first-time provisioning and full recreate
//! - `lifecycle` - plain VM lifecycle passthrough (start/stop/destroy)
//! - `server` - server actions relayed to the guest (tests/restart)
//! - `ui` - frontend actions relayed to the guest
//! - `show` - display information
//! - `preflight` - host prerequisite checks

pub mod lifecycle;
pub mod preflight;
pub mod server;
pub mod setup;
pub mod show;
pub mod ui;

pub use lifecycle::{cmd_destroy, cmd_start, cmd_stop};
pub use preflight::cmd_preflight;
pub use server::{cmd_restart, cmd_tests};
pub use setup::{cmd_recreate, cmd_setup};
pub use show::cmd_show;
pub use ui::cmd_ui;
