//! Show command implementation

use std::time::Duration;

use anyhow::Result;

use crate::context::FleetContext;
use crate::output::format_sessions;

/// Execute the show command
///
/// Lists ready devices, or every session with `all`. With `watch`, the
/// bridge's tracking stream is observed for that many seconds first.
pub async fn show_command(ctx: &FleetContext, all: bool, watch: Option<u64>) -> Result<()> {
    let tracker = ctx.tracker();

    let mut sessions = match watch {
        Some(secs) => tracker.watch(Duration::from_secs(secs)).await?,
        None => tracker.snapshot().await?,
    };
    if !all {
        sessions.retain(|s| s.is_ready());
    }

    println!("{}", format_sessions(&sessions));
    Ok(())
}
