//! Load command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};

use df_core::error::CacheError;
use df_core::scan::load_scan_results;
use df_core::Registry;

use crate::context::FleetContext;
use crate::output::{print_success, print_warning};

/// Execute the load command
///
/// Merges the endpoints found in a scan result file into the cached
/// registry and, with `share`, into the registry daemon.
pub async fn load_command(ctx: &FleetContext, file: Option<PathBuf>, share: bool) -> Result<()> {
    let path = file.unwrap_or_else(|| ctx.config().scanner.output_file.clone());
    let loaded = load_scan_results(&path)?;

    let cache = ctx.cache();
    let mut registry = match cache.load() {
        Ok(registry) => registry,
        Err(CacheError::NotFound(_)) => Registry::new(),
        Err(e @ CacheError::Corrupt { .. }) => {
            print_warning(&format!("{}; starting a new registry", e));
            Registry::new()
        }
        Err(e) => return Err(e).context("Failed to read registry cache"),
    };

    let added = registry.merge(loaded.iter().cloned());
    cache
        .save(&registry)
        .with_context(|| format!("Failed to write registry cache {:?}", cache.path()))?;

    print_success(&format!(
        "Loaded {} endpoint(s) from {} ({} new, {} cached)",
        loaded.len(),
        path.display(),
        added,
        registry.len()
    ));

    if share {
        let client = ctx.daemon_client();
        let (added, total) = client.merge(loaded.to_vec()).await?;
        print_success(&format!(
            "Shared with registry daemon ({} new, {} total)",
            added, total
        ));
    }

    Ok(())
}
