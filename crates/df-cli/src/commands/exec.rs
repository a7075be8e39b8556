//! Exec command implementation

use anyhow::{Context, Result};

use crate::context::FleetContext;
use crate::output::print_info;

/// Execute a shell command on one connected device
pub async fn exec_command(ctx: &FleetContext, serial: &str, command: &[String]) -> Result<()> {
    let command = command.join(" ");
    if command.trim().is_empty() {
        anyhow::bail!("Command must not be empty");
    }

    let session = super::require_device(ctx, serial).await?;
    let output = ctx
        .bridge()
        .shell(&session.serial, &command)
        .await
        .with_context(|| format!("Failed to run `{}` on {}", command, serial))?;

    if output.trim().is_empty() {
        print_info("No output returned");
    } else {
        println!("{}", output.trim_end());
    }

    Ok(())
}
