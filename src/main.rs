//! hadev - dev VM driver for the home-automation server and its web frontend.
//!
//! Invoked two ways:
//! - on the host with a verb, to drive the VM's lifecycle and relay actions
//!   into it through sentinel flag files;
//! - inside the guest with no verb, as the VM tool's provisioner.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hadev::commands::{self, show::ShowTarget};
use hadev::config::Config;
use hadev::provision;
use hadev::relay::Action;

#[derive(Parser)]
#[command(name = "hadev")]
#[command(about = "Dev VM driver for the home-automation server and web frontend")]
#[command(
    after_help = "QUICK START:\n  hadev preflight   Check host prerequisites\n  hadev setup       Create and provision the VM\n  hadev tests       Run the server test suite in the VM\n  hadev ui build    Build the frontend in the VM\n\nWith no command, hadev runs as the guest-side provisioner."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the VM and run full provisioning from scratch
    Setup,

    /// Run the server test suite inside the VM
    Tests,

    /// Restart the managed service inside the VM
    Restart,

    /// Bring the VM up without reprovisioning
    Start,

    /// Halt the VM
    Stop,

    /// Destroy the VM
    Destroy,

    /// Destroy and recreate the VM with fresh provisioning
    Recreate,

    /// Frontend tasks (require the local frontend checkout)
    Ui {
        #[command(subcommand)]
        task: UiTask,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowWhat,
    },

    /// Run preflight checks (verify host prerequisites)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum UiTask {
    /// Install frontend dependencies
    Setup,
    /// Bootstrap the frontend (toolchain + dependencies + initial build)
    Bootstrap,
    /// One-shot development build
    Dev,
    /// Incremental build watcher (blocks until interrupted)
    DevWatch,
    /// Run the frontend test suite
    Test,
    /// Production build
    Build,
}

#[derive(Subcommand)]
enum ShowWhat {
    /// Show current configuration
    Config,
    /// Show setup marker, pending flags and VM status
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();

    let base_dir = match std::env::var_os("HADEV_BASE_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let config = Config::load(&base_dir);

    match cli.command {
        // No verb: this is the guest-side provisioning entrypoint.
        None => provision::cmd_provision(&config),

        Some(Commands::Setup) => commands::cmd_setup(&config),
        Some(Commands::Tests) => commands::cmd_tests(&config),
        Some(Commands::Restart) => commands::cmd_restart(&config),
        Some(Commands::Start) => commands::cmd_start(&config),
        Some(Commands::Stop) => commands::cmd_stop(&config),
        Some(Commands::Destroy) => commands::cmd_destroy(&config),
        Some(Commands::Recreate) => commands::cmd_recreate(&config),

        Some(Commands::Ui { task }) => {
            let action = match task {
                UiTask::Setup => Action::UiSetup,
                UiTask::Bootstrap => Action::UiBootstrap,
                UiTask::Dev => Action::UiDev,
                UiTask::DevWatch => Action::UiDevWatch,
                UiTask::Test => Action::UiTest,
                UiTask::Build => Action::UiBuild,
            };
            commands::cmd_ui(&config, action)
        }

        Some(Commands::Show { what }) => {
            let target = match what {
                ShowWhat::Config => ShowTarget::Config,
                ShowWhat::Status => ShowTarget::Status,
            };
            commands::cmd_show(&config, target)
        }

        Some(Commands::Preflight { strict }) => commands::cmd_preflight(&config, strict),
    }
}
