//! Clear-cache command implementation

use anyhow::{Context, Result};

use crate::context::FleetContext;
use crate::output::{print_info, print_success};

/// Delete the local registry cache
pub fn clear_cache_command(ctx: &FleetContext) -> Result<()> {
    let cache = ctx.cache();
    let removed = cache
        .clear()
        .with_context(|| format!("Failed to remove {:?}", cache.dir()))?;

    if removed {
        print_success(&format!("Cleared cache at {}", cache.dir().display()));
    } else {
        print_info("Cache is already empty");
    }
    Ok(())
}
