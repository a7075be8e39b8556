//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use df_protocol::{Endpoint, BRIDGE_DEFAULT_PORT};

/// Connection state of a bridge session
///
/// Every session is always in exactly one of these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    /// Authorized and ready for commands
    Device,
    /// Known to the bridge but not responding
    Offline,
    /// Waiting for the user to accept the host key on the device
    Unauthorized,
    /// No longer present on the bridge
    Absent,
    /// Any state the bridge reports that is not listed above
    Unknown,
}

impl SessionStatus {
    /// Classify a state word reported by the bridge
    pub fn from_state(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "device" => SessionStatus::Device,
            "offline" => SessionStatus::Offline,
            "unauthorized" => SessionStatus::Unauthorized,
            "absent" => SessionStatus::Absent,
            _ => SessionStatus::Unknown,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Device => write!(f, "DEVICE"),
            SessionStatus::Offline => write!(f, "OFFLINE"),
            SessionStatus::Unauthorized => write!(f, "UNAUTHORIZED"),
            SessionStatus::Absent => write!(f, "ABSENT"),
            SessionStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A live bridge session as observed from the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bridge serial (an `address:port` for network devices)
    pub serial: String,
    /// Whether the bridge still lists the device
    pub present: bool,
    /// Connection state
    pub status: SessionStatus,
}

impl Session {
    /// Create a session from a serial and its reported state word
    pub fn from_state(serial: impl Into<String>, state: &str) -> Self {
        Self::new(serial, SessionStatus::from_state(state))
    }

    /// Create a session with a known status
    pub fn new(serial: impl Into<String>, status: SessionStatus) -> Self {
        Self {
            serial: serial.into(),
            present: status != SessionStatus::Absent,
            status,
        }
    }

    /// Create a session for a device that disappeared
    pub fn absent(serial: impl Into<String>) -> Self {
        Self::new(serial, SessionStatus::Absent)
    }

    /// Whether the session is ready for commands
    pub fn is_ready(&self) -> bool {
        self.present && self.status == SessionStatus::Device
    }
}

/// Outcome of running one command on one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Device the command ran on
    pub serial: String,
    /// Captured output (empty on failure)
    pub output: String,
    /// Error message if the command could not be run
    pub error: Option<String>,
}

impl CommandResult {
    /// Result of a successful execution
    pub fn success(serial: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            output: output.into(),
            error: None,
        }
    }

    /// Result of a failed execution
    pub fn failure(serial: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Whether the command ran
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the device printed anything
    pub fn has_output(&self) -> bool {
        !self.output.trim().is_empty()
    }
}

/// One port entry of a scan record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEntry {
    /// Port number
    pub port: u16,
    /// State reported by the scanner (e.g. "open")
    pub state: String,
}

/// One host as reported by the port scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Host address
    pub ip: String,
    /// Ports in scanner order
    pub ports: Vec<PortEntry>,
}

impl ScanRecord {
    /// Create a record with a single open port
    pub fn open(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            ports: vec![PortEntry {
                port,
                state: "open".to_string(),
            }],
        }
    }

    /// Endpoint to register for this record
    ///
    /// Only the first port is consulted. Records without ports, with an
    /// unparsable address, or whose first port is the bridge's well-known
    /// port yield `None`.
    pub fn endpoint(&self) -> Option<Endpoint> {
        let first = self.ports.first()?;
        if first.port == BRIDGE_DEFAULT_PORT {
            return None;
        }
        Endpoint::new(self.ip.clone(), first.port).ok()
    }
}
