//! Kill-server command implementation

use anyhow::Result;

use crate::context::FleetContext;
use crate::output::{print_error, print_info, print_success};

/// Disconnect every ready device
pub async fn kill_server_command(ctx: &FleetContext) -> Result<()> {
    let sessions = ctx.tracker().ready().await?;
    if sessions.is_empty() {
        print_info("No devices connected");
        return Ok(());
    }

    let report = ctx.connector().disconnect_ready(&sessions).await;

    for serial in &report.disconnected {
        print_success(&format!("Disconnected {}", serial));
    }
    for (serial, error) in &report.failed {
        print_error(&format!("Failed to disconnect {}: {}", serial, error));
    }

    if report.disconnected.is_empty() {
        anyhow::bail!("Failed to disconnect {} device(s)", report.failed.len());
    }
    Ok(())
}
