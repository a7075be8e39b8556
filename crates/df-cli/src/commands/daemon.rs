//! Registry daemon commands

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use df_core::Registry;
use df_daemon::{seed_registry, shutdown_on_signal, DaemonSettings, RegistryDaemon};

use crate::context::FleetContext;
use crate::output::{format_endpoints, print_success, print_warning};

/// Start the registry daemon
///
/// Without `foreground` the CLI re-spawns itself detached and returns.
pub async fn daemon_start(
    ctx: &FleetContext,
    foreground: bool,
    bind: Option<String>,
    seed_from_cache: bool,
) -> Result<()> {
    let mut settings = DaemonSettings::from(&ctx.config().daemon);
    if let Some(bind) = &bind {
        settings.address = bind.clone();
    }

    if !foreground {
        let client = crate::ipc::RegistryClient::with_address(settings.address.clone());
        if client.is_running().await {
            print_warning(&format!(
                "Registry daemon is already running at {}",
                settings.address
            ));
            return Ok(());
        }

        // Daemonize by re-spawning ourselves
        let exe = std::env::current_exe()?;
        let mut cmd = std::process::Command::new(exe);
        cmd.arg("daemon").arg("start").arg("--foreground");
        cmd.arg("--bind").arg(&settings.address);
        if seed_from_cache {
            cmd.arg("--seed-from-cache");
        }
        if let Some(path) = ctx.config_path() {
            cmd.arg("--config").arg(path);
        }

        let child = cmd
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("Failed to start registry daemon")?;

        print_success(&format!(
            "Registry daemon started on {} (PID: {})",
            settings.address,
            child.id()
        ));
        return Ok(());
    }

    tracing::info!("droidfleet registry daemon starting...");

    let registry = if seed_from_cache {
        seed_registry(&ctx.cache())
    } else {
        Registry::new()
    };

    let cancel = CancellationToken::new();
    shutdown_on_signal(cancel.clone());

    let registry = RegistryDaemon::new(settings)
        .with_registry(registry)
        .with_shutdown_token(cancel)
        .run()
        .await?;

    tracing::info!(endpoints = registry.len(), "Registry daemon stopped");
    Ok(())
}

/// Ask the registry daemon to shut down
pub async fn daemon_stop(ctx: &FleetContext) -> Result<()> {
    let client = ctx.daemon_client();
    if !client.is_running().await {
        print_warning("Registry daemon is not running");
        return Ok(());
    }

    client.stop().await?;
    print_success("Registry daemon stopped");
    Ok(())
}

/// Print the shared registry
pub async fn daemon_list(ctx: &FleetContext) -> Result<()> {
    let endpoints = ctx.daemon_client().list().await?;
    println!("{}", format_endpoints(&endpoints));
    Ok(())
}
