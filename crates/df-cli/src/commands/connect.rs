//! Connect command implementation

use anyhow::{Context, Result};

use df_core::error::CacheError;
use df_core::{Endpoint, Registry};
use df_orchestrator::ConnectReport;

use crate::context::FleetContext;
use crate::output::{format_connect_failures, print_info, print_success, print_warning};

/// Where the connect command takes its endpoints from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// One endpoint given on the command line
    Single(String),
    /// The local registry cache
    Cache,
    /// The registry daemon
    Shared,
}

impl RegistrySource {
    pub fn from_args(socket: Option<String>, shared: bool) -> Self {
        match (socket, shared) {
            (Some(socket), _) => RegistrySource::Single(socket),
            (None, true) => RegistrySource::Shared,
            (None, false) => RegistrySource::Cache,
        }
    }
}

/// Execute the connect command
pub async fn connect_command(ctx: &FleetContext, source: RegistrySource) -> Result<()> {
    let connector = ctx.connector();

    let report = match &source {
        RegistrySource::Single(socket) => {
            let endpoint: Endpoint = socket
                .parse()
                .with_context(|| format!("Invalid endpoint '{}'", socket))?;
            connector.connect_one(&endpoint).await
        }
        RegistrySource::Cache => {
            let registry = match ctx.cache().load() {
                Ok(registry) => registry,
                Err(CacheError::NotFound(_)) => anyhow::bail!(
                    "No registry cache found. Run `droidfleet scan` and `droidfleet load` first"
                ),
                Err(e) => return Err(e.into()),
            };
            if registry.is_empty() {
                print_warning("Registry is empty, nothing to connect");
                return Ok(());
            }
            print_info(&format!("Connecting to {} endpoint(s)...", registry.len()));
            connector.connect_all(&registry).await
        }
        RegistrySource::Shared => {
            let registry: Registry = ctx.daemon_client().list().await?.into_iter().collect();
            if registry.is_empty() {
                print_warning("Shared registry is empty, nothing to connect");
                return Ok(());
            }
            print_info(&format!("Connecting to {} endpoint(s)...", registry.len()));
            connector.connect_all(&registry).await
        }
    };

    report_connections(&report);

    if let RegistrySource::Single(socket) = &source {
        if !report.all_connected() {
            anyhow::bail!("Failed to connect to {}", socket);
        }
    } else if !report.any_connected() {
        anyhow::bail!("No endpoint could be connected");
    }

    Ok(())
}

fn report_connections(report: &ConnectReport) {
    for endpoint in &report.connected {
        print_success(&format!("Connected to {}", endpoint));
    }

    if report.failed.is_empty() {
        return;
    }

    println!("{}", format_connect_failures(&report.failed));
    if report.any_connected() {
        print_warning(&format!(
            "Connected {} of {} endpoint(s)",
            report.connected.len(),
            report.attempted
        ));
    }
}
