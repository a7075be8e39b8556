//! Bridge endpoint type

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Well-known port of the device bridge when listening over TCP
///
/// Scan records whose first port is this one are never registered.
pub const BRIDGE_DEFAULT_PORT: u16 = 5555;

/// An `address:port` pair identifying a reachable bridge listener
///
/// Endpoints compare by value and render canonically as `address:port`
/// (`[address]:port` for IPv6 literals).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ProtocolError> {
        let host = host.into();
        let host = host.trim().trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(ProtocolError::InvalidEndpoint(format!("{}:{}", host, port)));
        }
        if port == 0 {
            return Err(ProtocolError::InvalidEndpoint(format!("{}:0", host)));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Host part (IP address or hostname)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ProtocolError::InvalidEndpoint(s.to_string());

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        // A bare IPv6 literal without brackets is ambiguous
        if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
            return Err(invalid());
        }
        let port: u16 = port.parse().map_err(|_| invalid())?;
        Endpoint::new(host, port).map_err(|_| invalid())
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
