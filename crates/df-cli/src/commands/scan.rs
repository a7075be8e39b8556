//! Scan command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};

use df_core::scan::{run_scan, ScanRequest, ScanTarget};

use crate::context::FleetContext;
use crate::output::{print_info, print_success, ScanProgress};

/// Execute the scan command
///
/// Validates the target before the scanner is started.
pub async fn scan_command(
    ctx: &FleetContext,
    network: &str,
    ports: &str,
    ipv6: bool,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let target = ScanTarget::new(network, ports, ipv6)?;
    let request = ScanRequest {
        target,
        program: ctx.config().scanner.program.clone(),
        output: output.unwrap_or_else(|| ctx.config().scanner.output_file.clone()),
    };

    let mut progress = if quiet {
        ScanProgress::hidden()
    } else {
        ScanProgress::new(request.target.network())
    };

    let result = run_scan(&request, |event| progress.handle(event)).await;
    progress.finish();
    let summary = result.with_context(|| format!("Scan of {} failed", request.target.network()))?;

    if let Some(percent) = summary.last_progress {
        tracing::debug!("Scanner reached {:.2}%", percent);
    }
    if !summary.records.is_empty() {
        print_info(&format!(
            "Scanner reported {} open port(s)",
            summary.records.len()
        ));
    }
    print_success(&format!(
        "Scan finished, results written to {}",
        request.output.display()
    ));
    print_info(&format!(
        "Import them with `droidfleet load --file {}`",
        request.output.display()
    ));

    Ok(())
}
