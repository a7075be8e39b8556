//! Output formatting utilities for the CLI
//!
//! Tables for sessions, command results and endpoints, the scan progress
//! display, and colored status messages.

mod progress;

pub use progress::ScanProgress;

use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

use df_core::{CommandResult, Endpoint, Session};
use df_orchestrator::ConnectFailure;

/// Widest an output cell may get before wrapping
const OUTPUT_WIDTH: usize = 100;

/// Format bridge sessions as a table
///
/// # Arguments
/// * `sessions` - Sessions to display, in bridge order
///
/// # Returns
/// A formatted string, or "No devices connected" if the list is empty.
pub fn format_sessions(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No devices connected".to_string();
    }

    #[derive(Tabled)]
    struct SessionRow {
        #[tabled(rename = "SERIAL")]
        serial: String,
        #[tabled(rename = "PRESENT")]
        present: String,
        #[tabled(rename = "STATUS")]
        status: String,
    }

    let rows: Vec<SessionRow> = sessions
        .iter()
        .map(|s| SessionRow {
            serial: s.serial.clone(),
            present: if s.present { "yes" } else { "no" }.to_string(),
            status: s.status.to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format per-device command output as a table
///
/// Failed executions show their error in place of output.
pub fn format_results(results: &[CommandResult]) -> String {
    if results.is_empty() {
        return "No output returned".to_string();
    }

    #[derive(Tabled)]
    struct ResultRow {
        #[tabled(rename = "DEVICE")]
        device: String,
        #[tabled(rename = "OUTPUT")]
        output: String,
    }

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|r| ResultRow {
            device: r.serial.clone(),
            output: match &r.error {
                Some(error) => format!("error: {}", error),
                None => r.output.trim_end().to_string(),
            },
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Width::wrap(OUTPUT_WIDTH))
        .to_string()
}

/// Format registry endpoints as a table
pub fn format_endpoints(endpoints: &[Endpoint]) -> String {
    if endpoints.is_empty() {
        return "Registry is empty".to_string();
    }

    #[derive(Tabled)]
    struct EndpointRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "PORT")]
        port: u16,
    }

    let rows: Vec<EndpointRow> = endpoints
        .iter()
        .map(|e| EndpointRow {
            host: e.host().to_string(),
            port: e.port(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format failed connection attempts as a table
pub fn format_connect_failures(failures: &[(Endpoint, ConnectFailure)]) -> String {
    #[derive(Tabled)]
    struct FailureRow {
        #[tabled(rename = "ENDPOINT")]
        endpoint: String,
        #[tabled(rename = "REASON")]
        reason: String,
    }

    let rows: Vec<FailureRow> = failures
        .iter()
        .map(|(endpoint, failure)| FailureRow {
            endpoint: endpoint.to_string(),
            reason: truncate(&failure.to_string(), 60),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Truncate a string with ellipsis if too long
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a success message in green with a checkmark prefix
///
/// Outputs to stdout with green coloring for positive feedback to the user.
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan to stdout
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
