//! Port-scanner integration
//!
//! The scanner runs as a subprocess. Its status output is split into lines
//! by [`ScanLineCodec`], classified by [`ScanStreamParser`], and the JSON
//! file it writes is read back with [`load_scan_results`].

mod lines;
mod parser;
mod results;
mod runner;
mod target;

pub use lines::ScanLineCodec;
pub use parser::{ScanEvent, ScanStreamParser};
pub use results::{load_scan_results, read_scan_records};
pub use runner::{parse_stream, run_scan, ScanRequest, ScanSummary};
pub use target::{validate_network, validate_ports, ScanTarget};
