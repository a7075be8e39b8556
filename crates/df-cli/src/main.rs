//! droidfleet CLI
//!
//! Single binary for every droidfleet operation:
//! - Discovery (scan a network, load results into the registry)
//! - Sessions (connect, show, kill-server)
//! - Commands (broadcast, exec, push, pull, install)
//! - Registry daemon (share one registry between invocations)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use df_core::traits::InstallOptions;
use droidfleet::commands::{self, RegistrySource};
use droidfleet::context::FleetContext;
use droidfleet::prompt::ShowResults;

#[derive(Parser)]
#[command(name = "droidfleet")]
#[command(author, version, about = "Discover, connect and drive fleets of Android devices")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Registry daemon address (overrides config)
    #[arg(long, global = true, env = "DROIDFLEET_DAEMON")]
    daemon_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a network for open bridge ports
    Scan {
        /// Network in CIDR notation (e.g. 192.168.1.0/24)
        network: String,
        /// Ports to probe (e.g. 5555, 5555-5585 or 80,5555-5585)
        ports: String,
        /// Treat the network as IPv6
        #[arg(long)]
        ipv6: bool,
        /// Scan result file (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load scan results into the registry
    Load {
        /// Scan result file (defaults to the scanner output file)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Also merge the endpoints into the registry daemon
        #[arg(long)]
        share: bool,
    },

    /// Connect to the devices in the registry
    Connect {
        /// Connect to this endpoint only (address:port)
        #[arg(short, long)]
        socket: Option<String>,
        /// Read the registry from the registry daemon
        #[arg(long, conflicts_with = "socket")]
        shared: bool,
    },

    /// List connected devices
    Show {
        /// Include devices that are not ready
        #[arg(short, long)]
        all: bool,
        /// Watch session changes for this many seconds first
        #[arg(short, long, value_name = "SECS")]
        watch: Option<u64>,
    },

    /// Run a shell command on every connected device
    #[command(alias = "broad-cmd")]
    Broadcast {
        /// Command to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
        /// Show the results without asking
        #[arg(short, long)]
        yes: bool,
        /// Do not show the results
        #[arg(short, long, conflicts_with = "yes")]
        no: bool,
    },

    /// Run a shell command on one device
    Exec {
        /// Device serial (address:port)
        serial: String,
        /// Command to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Copy a file to the connected devices
    Push {
        /// Local file
        local: PathBuf,
        /// Absolute destination path or directory on the device
        remote: String,
        /// Push to this device only
        #[arg(short, long)]
        socket: Option<String>,
    },

    /// Copy a file from one device
    Pull {
        /// Device serial (address:port)
        serial: String,
        /// Absolute path on the device
        remote: String,
        /// Local destination
        local: PathBuf,
    },

    /// Install a package on every connected device
    Install {
        /// Package file
        apk: PathBuf,
        /// Allow version downgrade
        #[arg(short, long)]
        downgrade: bool,
        /// Grant every runtime permission
        #[arg(short, long)]
        grant: bool,
    },

    /// Disconnect every connected device
    KillServer,

    /// Delete the local registry cache
    #[command(alias = "clear")]
    ClearCache,

    /// Manage the registry daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the registry daemon
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
        /// Start with the endpoints of the local registry cache
        #[arg(long)]
        seed_from_cache: bool,
    },
    /// Stop the registry daemon
    Stop,
    /// Show the shared registry
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let ctx = FleetContext::load(cli.config.as_deref(), cli.daemon_addr)?;

    match cli.command {
        Commands::Scan {
            network,
            ports,
            ipv6,
            output,
        } => {
            commands::scan_command(&ctx, &network, &ports, ipv6, output, cli.quiet).await?;
        }

        Commands::Load { file, share } => {
            commands::load_command(&ctx, file, share).await?;
        }

        Commands::Connect { socket, shared } => {
            commands::connect_command(&ctx, RegistrySource::from_args(socket, shared)).await?;
        }

        Commands::Show { all, watch } => {
            commands::show_command(&ctx, all, watch).await?;
        }

        Commands::Broadcast { command, yes, no } => {
            commands::broadcast_command(&ctx, &command, ShowResults::from_flags(yes, no)).await?;
        }

        Commands::Exec { serial, command } => {
            commands::exec_command(&ctx, &serial, &command).await?;
        }

        Commands::Push {
            local,
            remote,
            socket,
        } => {
            commands::push_command(&ctx, &local, &remote, socket.as_deref()).await?;
        }

        Commands::Pull {
            serial,
            remote,
            local,
        } => {
            commands::pull_command(&ctx, &serial, &remote, &local).await?;
        }

        Commands::Install {
            apk,
            downgrade,
            grant,
        } => {
            let options = InstallOptions {
                replace: true,
                allow_downgrade: downgrade,
                grant_permissions: grant,
                allow_test: false,
            };
            commands::install_command(&ctx, &apk, options).await?;
        }

        Commands::KillServer => {
            commands::kill_server_command(&ctx).await?;
        }

        Commands::ClearCache => {
            commands::clear_cache_command(&ctx)?;
        }

        Commands::Daemon { action } => match action {
            DaemonAction::Start {
                foreground,
                bind,
                seed_from_cache,
            } => {
                commands::daemon_start(&ctx, foreground, bind, seed_from_cache).await?;
            }
            DaemonAction::Stop => {
                commands::daemon_stop(&ctx).await?;
            }
            DaemonAction::List => {
                commands::daemon_list(&ctx).await?;
            }
        },
    }

    Ok(())
}
