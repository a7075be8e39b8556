//! Scanner status-stream parser

use crate::types::ScanRecord;

/// Event produced from one line of scanner output
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// Diagnostic line forwarded verbatim
    Log(String),
    /// Completion percentage (0.0 to 100.0)
    Progress(f64),
    /// The scanner is waiting for late replies (e.g. "3s")
    Waiting(String),
    /// Found-service indicator (e.g. "FOUND=2")
    Found(String),
    /// A host announced on the status stream
    Discovered(ScanRecord),
    /// Sentinel: the stream is over, later lines are ignored
    End,
}

/// Line classifier for the scanner's status stream
///
/// Lines without `%` are diagnostics. Lines with `%` are comma-delimited
/// status records such as
/// `rate:  0.50-kpps, 50.00% done, waiting 3-secs, found=1`.
/// A status record that cannot be understood ends the stream.
#[derive(Debug, Default)]
pub struct ScanStreamParser {
    last_progress: Option<f64>,
    finished: bool,
}

impl ScanStreamParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Last progress percentage seen
    pub fn last_progress(&self) -> Option<f64> {
        self.last_progress
    }

    /// Whether the end sentinel has been reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Classify one line (terminator already stripped)
    pub fn parse_line(&mut self, line: &str) -> Vec<ScanEvent> {
        if self.finished {
            return Vec::new();
        }

        if !line.contains('%') {
            return Self::parse_diagnostic(line);
        }

        match Self::parse_status(line) {
            Some((progress, detail)) => {
                self.last_progress = Some(progress);
                vec![ScanEvent::Progress(progress), detail]
            }
            None => {
                tracing::debug!(line, "Unrecognized status line, ending scan stream");
                self.finished = true;
                vec![ScanEvent::End]
            }
        }
    }

    fn parse_diagnostic(line: &str) -> Vec<ScanEvent> {
        if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
            return Vec::new();
        }

        let mut events = vec![ScanEvent::Log(line.to_string())];
        if let Some(record) = parse_discovered(line) {
            events.push(ScanEvent::Discovered(record));
        }
        events
    }

    fn parse_status(line: &str) -> Option<(f64, ScanEvent)> {
        let fields: Vec<&str> = line.split(',').collect();

        let percent_field = fields
            .get(1)
            .filter(|f| f.contains('%'))
            .or_else(|| fields.iter().find(|f| f.contains('%')))?;
        let progress = parse_percent(percent_field)?;

        let marker = fields.get(2)?;
        let detail = if marker.contains("waiting") {
            ScanEvent::Waiting(waiting_label(marker))
        } else {
            ScanEvent::Found(fields.get(3)?.trim().to_uppercase())
        };

        Some((progress, detail))
    }
}

/// Numeric prefix of a `NN.NN%` field, capped at 100
fn parse_percent(field: &str) -> Option<f64> {
    let (number, _) = field.split_once('%')?;
    let value: f64 = number.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value.min(100.0))
    } else {
        None
    }
}

/// Render `waiting: 3-secs` as `3s`
fn waiting_label(field: &str) -> String {
    let after = field
        .split_once("waiting")
        .map(|(_, rest)| rest)
        .unwrap_or(field);
    let digits: String = after
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        field.trim().to_string()
    } else {
        format!("{}s", digits)
    }
}

/// Parse `Discovered open port 5037/tcp on 10.0.0.5`
fn parse_discovered(line: &str) -> Option<ScanRecord> {
    let rest = line.strip_prefix("Discovered open port ")?;
    let mut parts = rest.split_whitespace();

    let port_proto = parts.next()?;
    if parts.next()? != "on" {
        return None;
    }
    let ip = parts.next()?;

    let port = port_proto.split('/').next()?.parse::<u16>().ok()?;
    Some(ScanRecord::open(ip, port))
}
