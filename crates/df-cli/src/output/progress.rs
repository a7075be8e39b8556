//! Scan progress display

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use df_core::scan::ScanEvent;

const TEMPLATE: &str = "[{prefix}] {elapsed_precise} {bar:36.cyan/blue} {pos:>3}% {msg}";

/// Progress bar driven by scanner events
pub struct ScanProgress {
    bar: ProgressBar,
    found: Option<String>,
    waiting: Option<String>,
}

impl ScanProgress {
    /// Create a visible progress bar for scanning `network`
    pub fn new(network: &str) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_prefix(network.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("■■□"),
        );
        Self::with_bar(bar)
    }

    /// Create a progress tracker that draws nothing
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(100),
            ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            found: None,
            waiting: None,
        }
    }

    /// Apply one scanner event
    pub fn handle(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::Log(line) => {
                if !line.trim().is_empty() {
                    self.bar.println(line.trim_end());
                }
            }
            ScanEvent::Progress(percent) => {
                self.bar.set_position(percent.round() as u64);
            }
            ScanEvent::Waiting(secs) => {
                self.waiting = Some(secs.clone());
                self.refresh_message();
            }
            ScanEvent::Found(found) => {
                self.found = Some(found.clone());
                self.refresh_message();
            }
            ScanEvent::Discovered(record) => {
                tracing::debug!(ip = %record.ip, "Host announced by scanner");
            }
            ScanEvent::End => {
                self.bar.finish();
            }
        }
    }

    /// Current bar position in percent
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Text shown after the bar
    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn refresh_message(&self) {
        let message = match (&self.waiting, &self.found) {
            (Some(waiting), Some(found)) => format!("waiting {} {}", waiting, found),
            (Some(waiting), None) => format!("waiting {}", waiting),
            (None, Some(found)) => found.clone(),
            (None, None) => String::new(),
        };
        self.bar.set_message(message);
    }
}
