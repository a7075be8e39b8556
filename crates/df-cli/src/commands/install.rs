//! Install command implementation

use std::path::Path;

use anyhow::Result;

use df_core::traits::InstallOptions;

use crate::context::FleetContext;
use crate::output::{print_error, print_success};

/// Install a package on every ready device
///
/// Succeeds if at least one device installed it.
pub async fn install_command(ctx: &FleetContext, package: &Path, options: InstallOptions) -> Result<()> {
    if !package.is_file() {
        anyhow::bail!("Package not found: {}", package.display());
    }

    let sessions = super::require_devices(ctx).await?;
    let bridge = ctx.bridge();

    let mut installed = 0;
    for session in &sessions {
        match bridge.install(&session.serial, package, options).await {
            Ok(_) => {
                installed += 1;
                print_success(&format!("Installed on {}", session.serial));
            }
            Err(e) => {
                print_error(&format!("Failed to install on {}: {}", session.serial, e));
            }
        }
    }

    if installed == 0 {
        anyhow::bail!("Installation failed on every device");
    }
    Ok(())
}
