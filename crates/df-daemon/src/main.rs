//! droidfleet registry daemon
//!
//! Shares one endpoint registry between CLI invocations over localhost TCP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use df_core::config::{self, FleetConfig};
use df_core::{Registry, RegistryCache};
use df_daemon::{seed_registry, shutdown_on_signal, DaemonSettings, RegistryDaemon};

#[derive(Parser)]
#[command(name = "df-daemon")]
#[command(about = "droidfleet registry daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Start with the endpoints of the local registry cache
    #[arg(long)]
    seed_from_cache: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config: FleetConfig = match &args.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => config::load_config_or_default(&config::default_config_path())
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to load default config: {}", e);
                FleetConfig::default()
            }),
    };

    let mut settings = DaemonSettings::from(&config.daemon);
    if let Some(bind) = args.bind {
        settings.address = bind;
    }

    let registry = if args.seed_from_cache {
        seed_registry(&RegistryCache::new(config.cache_dir()))
    } else {
        Registry::new()
    };

    let cancel = CancellationToken::new();
    shutdown_on_signal(cancel.clone());

    RegistryDaemon::new(settings)
        .with_registry(registry)
        .with_shutdown_token(cancel)
        .run()
        .await?;

    Ok(())
}
