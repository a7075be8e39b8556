//! CLI command implementations

mod broadcast;
mod clear;
mod connect;
mod daemon;
mod exec;
mod install;
mod kill_server;
mod load;
mod scan;
mod show;
mod transfer;

pub use broadcast::broadcast_command;
pub use clear::clear_cache_command;
pub use connect::{connect_command, RegistrySource};
pub use daemon::{daemon_list, daemon_start, daemon_stop};
pub use exec::exec_command;
pub use install::install_command;
pub use kill_server::kill_server_command;
pub use load::load_command;
pub use scan::scan_command;
pub use show::show_command;
pub use transfer::{pull_command, push_command, remote_target};

use anyhow::Result;
use df_core::Session;

use crate::context::FleetContext;

/// Ready sessions, failing if there are none
async fn require_devices(ctx: &FleetContext) -> Result<Vec<Session>> {
    let sessions = ctx.tracker().ready().await?;
    if sessions.is_empty() {
        anyhow::bail!("No devices connected. Run `droidfleet connect` first");
    }
    Ok(sessions)
}

/// The ready session for `serial`
async fn require_device(ctx: &FleetContext, serial: &str) -> Result<Session> {
    let sessions = ctx.tracker().ready().await?;
    sessions
        .into_iter()
        .find(|s| s.serial == serial)
        .ok_or_else(|| anyhow::anyhow!("Device {} is not connected", serial))
}
