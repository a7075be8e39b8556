//! Core error types for droidfleet

use df_protocol::ProtocolError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the droidfleet ecosystem
#[derive(Error, Debug)]
pub enum DfError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Registry cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Scan error
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Bridge error
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registry cache errors
///
/// `NotFound` and `Corrupt` are kept apart so callers can decide whether
/// discovery has to be run again.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache was never created (or was cleared)
    #[error("Registry cache not found: {0}")]
    NotFound(PathBuf),

    /// The cache exists but cannot be trusted
    #[error("Registry cache {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scanner-related errors
#[derive(Error, Debug)]
pub enum ScanError {
    /// Network specification is not valid
    #[error("{0} is not a valid network (expected address/mask, e.g. 192.168.1.0/24)")]
    InvalidNetwork(String),

    /// Port specification is not valid
    #[error("{0} is not a valid port specification (e.g. 5555, 5555-5585 or 80,5555-5585)")]
    InvalidPorts(String),

    /// Scan results file does not exist
    #[error("Scan results file not found: {0}")]
    ResultsNotFound(PathBuf),

    /// Scan results file is not valid JSON
    #[error("Unable to read scan results from {path}: {source}")]
    InvalidResults {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Scanner executable could not be started
    #[error("Failed to start scanner '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Scanner exited with a non-zero status
    #[error("Scanner exited with {}: {stderr}", exit_label(.code))]
    ProcessFailed { code: Option<i32>, stderr: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Device-bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Operation did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Bridge server answered with FAIL
    #[error("Bridge refused request: {0}")]
    Failed(String),

    /// Device is not known to the bridge
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Unexpected bytes on the bridge connection
    #[error("Bridge protocol error: {0}")]
    Protocol(String),

    /// Invalid argument (e.g. relative remote path)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// External bridge tool failed
    #[error("Bridge tool failed ({status}): {stderr}")]
    Tool { status: String, stderr: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
