//! Broadcast command implementation

use anyhow::Result;

use df_orchestrator::DispatchOutcome;

use crate::context::FleetContext;
use crate::output::{format_results, print_info, print_warning};
use crate::prompt::{self, ShowResults};

/// Execute the broadcast command
///
/// Runs `command` on every ready device and offers the collected output.
pub async fn broadcast_command(ctx: &FleetContext, command: &[String], show: ShowResults) -> Result<()> {
    let command = command.join(" ");

    let report = match ctx.dispatcher().broadcast(&command).await? {
        DispatchOutcome::NoDevices => {
            anyhow::bail!("No devices connected. Run `droidfleet connect` first");
        }
        DispatchOutcome::Completed(report) => report,
    };

    print_info(&format!(
        "Ran `{}` on {} device(s)",
        command, report.attempted
    ));
    if report.failed > 0 {
        print_warning(&format!("{} device(s) failed", report.failed));
    }

    if !report.has_output() {
        print_info("No output returned");
    } else {
        let display = match show {
            ShowResults::Always => true,
            ShowResults::Never => false,
            ShowResults::Ask => prompt::confirm("Show the results?")?,
        };
        if display {
            println!("{}", format_results(&report.results));
        }
    }

    if report.succeeded == 0 {
        anyhow::bail!("Command failed on every device");
    }

    Ok(())
}
