//! Registry daemon messages
//!
//! One request per TCP connection, one newline-terminated line each way.
//! The request vocabulary is `list`, `stop`, or a bracketed list of
//! endpoints (`["10.0.0.5:5037","10.0.0.6:5037"]` or `[10.0.0.5:5037]`).
//! Tagged JSON objects (`{"type":"list"}`) are accepted as well.

use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::error::ProtocolError;

/// Default TCP port of the registry daemon
pub const DEFAULT_DAEMON_PORT: u16 = 65535;

/// Default upper bound for a single frame, newline excluded
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Default daemon address (localhost only)
pub fn default_daemon_address() -> String {
    format!("127.0.0.1:{}", DEFAULT_DAEMON_PORT)
}

/// Request sent by a client to the registry daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryRequest {
    /// Return the current registry
    List,

    /// Merge endpoints into the registry
    Merge { endpoints: Vec<Endpoint> },

    /// Stop the daemon after this request
    Stop,
}

impl RegistryRequest {
    /// Parse a request line
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let trimmed = line.trim();
        match trimmed {
            "list" => Ok(RegistryRequest::List),
            "stop" => Ok(RegistryRequest::Stop),
            _ if trimmed.starts_with('[') => Ok(RegistryRequest::Merge {
                endpoints: parse_endpoint_list(trimmed)?,
            }),
            _ if trimmed.starts_with('{') => Ok(serde_json::from_str(trimmed)?),
            _ => Err(ProtocolError::UnknownRequest(truncate(trimmed, 64))),
        }
    }

    /// Render the request as a single line (without the trailing newline)
    pub fn to_line(&self) -> String {
        match self {
            RegistryRequest::List => "list".to_string(),
            RegistryRequest::Stop => "stop".to_string(),
            RegistryRequest::Merge { endpoints } => render_endpoint_list(endpoints),
        }
    }
}

/// Response sent by the registry daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryResponse {
    /// Current registry contents
    Endpoints(Vec<Endpoint>),

    /// Result of a merge
    Merged { added: usize, total: usize },

    /// Daemon is shutting down
    Stopping,
}

/// Tagged form of the non-list responses
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Ack {
    Merged { added: usize, total: usize },
    Stopping,
}

impl RegistryResponse {
    /// Parse a response line
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            return Ok(RegistryResponse::Endpoints(parse_endpoint_list(trimmed)?));
        }
        match serde_json::from_str::<Ack>(trimmed) {
            Ok(Ack::Merged { added, total }) => Ok(RegistryResponse::Merged { added, total }),
            Ok(Ack::Stopping) => Ok(RegistryResponse::Stopping),
            Err(_) => Err(ProtocolError::UnexpectedResponse(truncate(trimmed, 64))),
        }
    }

    /// Render the response as a single line (without the trailing newline)
    pub fn to_line(&self) -> String {
        match self {
            RegistryResponse::Endpoints(endpoints) => render_endpoint_list(endpoints),
            RegistryResponse::Merged { added, total } => ack_line(&Ack::Merged {
                added: *added,
                total: *total,
            }),
            RegistryResponse::Stopping => ack_line(&Ack::Stopping),
        }
    }
}

fn ack_line(ack: &Ack) -> String {
    // A fieldless tagged enum always serializes
    serde_json::to_string(ack).unwrap_or_else(|_| String::from("{}"))
}

/// Render endpoints as a JSON array of strings
fn render_endpoint_list(endpoints: &[Endpoint]) -> String {
    serde_json::to_string(endpoints).unwrap_or_else(|_| String::from("[]"))
}

/// Split endpoints into merge requests whose lines fit in `max_len` bytes
///
/// Always yields at least one batch, so an empty merge still reaches the
/// daemon. An endpoint that alone exceeds `max_len` gets a batch of its own.
pub fn merge_batches(endpoints: Vec<Endpoint>, max_len: usize) -> Vec<Vec<Endpoint>> {
    let mut batches = Vec::new();
    let mut current: Vec<Endpoint> = Vec::new();
    // Brackets
    let mut line_len = 2;

    for endpoint in endpoints {
        let item_len = serde_json::to_string(&endpoint).map(|s| s.len()).unwrap_or(0);
        let extra = if current.is_empty() { item_len } else { item_len + 1 };
        if !current.is_empty() && line_len + extra > max_len {
            batches.push(std::mem::take(&mut current));
            line_len = 2 + item_len;
        } else {
            line_len += extra;
        }
        current.push(endpoint);
    }

    if !current.is_empty() || batches.is_empty() {
        batches.push(current);
    }
    batches
}

/// Parse a bracketed endpoint list, JSON or bare comma-separated
fn parse_endpoint_list(s: &str) -> Result<Vec<Endpoint>, ProtocolError> {
    if let Ok(endpoints) = serde_json::from_str::<Vec<Endpoint>>(s) {
        return Ok(endpoints);
    }

    let inner = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| ProtocolError::UnknownRequest(truncate(s, 64)))?;

    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
