//! Push and pull command implementations

use std::path::Path;

use anyhow::{Context, Result};

use df_core::traits::validate_remote_path;

use crate::context::FleetContext;
use crate::output::{print_error, print_success};

/// Device path a pushed file lands at
///
/// A remote path that already ends with the local file name is used as
/// is; otherwise it names a directory and the file name is appended.
pub fn remote_target(local: &Path, remote: &str) -> String {
    let name = match local.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return remote.to_string(),
    };

    // Only a whole final component names the file itself
    if remote.rsplit('/').next() == Some(name.as_ref()) {
        remote.to_string()
    } else {
        format!("{}/{}", remote.trim_end_matches('/'), name)
    }
}

/// Copy a local file to every ready device, or only to `socket`
pub async fn push_command(
    ctx: &FleetContext,
    local: &Path,
    remote: &str,
    socket: Option<&str>,
) -> Result<()> {
    validate_remote_path(remote)?;
    if !local.is_file() {
        anyhow::bail!("Local file not found: {}", local.display());
    }
    let target = remote_target(local, remote);

    let sessions = match socket {
        Some(serial) => vec![super::require_device(ctx, serial).await?],
        None => super::require_devices(ctx).await?,
    };
    let bridge = ctx.bridge();

    let mut pushed = 0;
    for session in &sessions {
        match bridge.push(&session.serial, local, &target).await {
            Ok(_) => {
                pushed += 1;
                print_success(&format!("Pushed to {}:{}", session.serial, target));
            }
            Err(e) => {
                print_error(&format!("Failed to push to {}: {}", session.serial, e));
            }
        }
    }

    if pushed == 0 {
        anyhow::bail!("Push failed on every device");
    }
    Ok(())
}

/// Copy a file from one connected device
pub async fn pull_command(ctx: &FleetContext, serial: &str, remote: &str, local: &Path) -> Result<()> {
    validate_remote_path(remote)?;
    let session = super::require_device(ctx, serial).await?;

    ctx.bridge()
        .pull(&session.serial, remote, local)
        .await
        .with_context(|| format!("Failed to pull {} from {}", remote, serial))?;

    print_success(&format!("Pulled {}:{} to {}", serial, remote, local.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_target_appends_file_name() {
        assert_eq!(
            remote_target(Path::new("build/app.apk"), "/sdcard/Download"),
            "/sdcard/Download/app.apk"
        );
        assert_eq!(
            remote_target(Path::new("app.apk"), "/sdcard/Download/"),
            "/sdcard/Download/app.apk"
        );
        assert_eq!(remote_target(Path::new("app.apk"), "/"), "/app.apk");
    }

    #[test]
    fn test_remote_target_suffix_is_not_file_name() {
        assert_eq!(
            remote_target(Path::new("app.apk"), "/sdcard/myapp.apk"),
            "/sdcard/myapp.apk/app.apk"
        );
        assert_eq!(
            remote_target(Path::new("log.txt"), "/data/local/tmp/catalog.txt"),
            "/data/local/tmp/catalog.txt/log.txt"
        );
    }

    #[test]
    fn test_remote_target_keeps_full_path() {
        assert_eq!(
            remote_target(Path::new("/tmp/app.apk"), "/sdcard/app.apk"),
            "/sdcard/app.apk"
        );
    }
}
