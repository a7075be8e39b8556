//! Scanner subprocess runner

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;

use super::lines::ScanLineCodec;
use super::parser::{ScanEvent, ScanStreamParser};
use super::target::ScanTarget;
use crate::error::ScanError;
use crate::types::ScanRecord;

/// Number of stderr lines kept for failure reports
const STDERR_TAIL: usize = 20;

/// One scanner invocation
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Validated network and ports
    pub target: ScanTarget,
    /// Scanner executable
    pub program: String,
    /// File the scanner writes JSON results to
    pub output: PathBuf,
}

impl ScanRequest {
    /// Arguments passed to the scanner
    pub fn args(&self) -> Vec<String> {
        vec![
            self.target.network().to_string(),
            "-p".to_string(),
            self.target.ports().to_string(),
            "-oJ".to_string(),
            self.output.display().to_string(),
        ]
    }
}

/// Outcome of a finished scan
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Last progress percentage reported
    pub last_progress: Option<f64>,
    /// Hosts announced on the status stream
    pub records: Vec<ScanRecord>,
    /// Exit code of the scanner
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Stdout,
    Stderr,
}

/// Feed a line-oriented reader through `parser`, reporting every event
///
/// Returns the records announced on the stream.
pub async fn parse_stream<R, F>(
    reader: R,
    parser: &mut ScanStreamParser,
    mut on_event: F,
) -> Result<Vec<ScanRecord>, ScanError>
where
    R: AsyncRead + Unpin,
    F: FnMut(&ScanEvent),
{
    let mut lines = FramedRead::new(reader, ScanLineCodec::new());
    let mut records = Vec::new();

    while let Some(line) = lines.next().await {
        for event in parser.parse_line(&line?) {
            if let ScanEvent::Discovered(record) = &event {
                records.push(record.clone());
            }
            on_event(&event);
        }
    }

    Ok(records)
}

fn forward<R>(
    reader: R,
    source: Source,
    tx: mpsc::Sender<(Source, String)>,
) -> tokio::task::JoinHandle<std::io::Result<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = FramedRead::new(reader, ScanLineCodec::new());
        while let Some(line) = lines.next().await {
            let line = line.map_err(|e| {
                tracing::warn!(?source, error = %e, "Failed to read scanner output");
                e
            })?;
            if tx.send((source, line)).await.is_err() {
                break;
            }
        }
        Ok(())
    })
}

/// Wait for every output reader, keeping the first failure
async fn join_readers(
    readers: Vec<tokio::task::JoinHandle<std::io::Result<()>>>,
) -> Result<(), ScanError> {
    let mut first_error = None;
    for reader in readers {
        let result = match reader.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::new(std::io::ErrorKind::Other, e)),
        };
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(ScanError::Io(e)),
        None => Ok(()),
    }
}

/// Run the scanner and stream its status through the parser
///
/// Both stdout and stderr are parsed; the scanner writes its status line
/// to stderr. A non-zero exit yields [`ScanError::ProcessFailed`] with the
/// tail of stderr.
pub async fn run_scan<F>(request: &ScanRequest, mut on_event: F) -> Result<ScanSummary, ScanError>
where
    F: FnMut(&ScanEvent),
{
    tracing::info!(
        program = %request.program,
        network = %request.target.network(),
        ports = %request.target.ports(),
        "Starting scan"
    );

    let mut child = Command::new(&request.program)
        .args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ScanError::Spawn {
            program: request.program.clone(),
            source,
        })?;

    let (tx, mut rx) = mpsc::channel(64);
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward(stdout, Source::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward(stderr, Source::Stderr, tx.clone()));
    }
    drop(tx);

    let mut parser = ScanStreamParser::new();
    let mut summary = ScanSummary::default();
    let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

    while let Some((source, line)) = rx.recv().await {
        if matches!(source, Source::Stderr) && !line.trim().is_empty() {
            if stderr_tail.len() == STDERR_TAIL {
                stderr_tail.pop_front();
            }
            stderr_tail.push_back(line.clone());
        }

        for event in parser.parse_line(&line) {
            if let ScanEvent::Discovered(record) = &event {
                summary.records.push(record.clone());
            }
            on_event(&event);
        }
    }

    let read_result = join_readers(readers).await;

    let status = child.wait().await?;
    summary.last_progress = parser.last_progress();
    summary.exit_code = status.code();

    if !status.success() {
        let stderr: Vec<String> = stderr_tail.into_iter().collect();
        tracing::warn!(code = ?status.code(), "Scanner failed");
        return Err(ScanError::ProcessFailed {
            code: status.code(),
            stderr: stderr.join("\n"),
        });
    }

    // Output may be incomplete even though the scanner succeeded
    read_result?;

    tracing::info!(
        progress = ?summary.last_progress,
        discovered = summary.records.len(),
        "Scan finished"
    );
    Ok(summary)
}
