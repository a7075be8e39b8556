//! Scanner JSON result files

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::error::ScanError;
use crate::registry::Registry;
use crate::types::{PortEntry, ScanRecord};

#[derive(Debug, Deserialize)]
struct RawRecord {
    ip: String,
    #[serde(default)]
    ports: Vec<RawPort>,
}

#[derive(Debug, Deserialize)]
struct RawPort {
    #[serde(deserialize_with = "port_number")]
    port: u16,
    #[serde(default)]
    status: Option<String>,
}

impl From<RawRecord> for ScanRecord {
    fn from(raw: RawRecord) -> Self {
        ScanRecord {
            ip: raw.ip,
            ports: raw
                .ports
                .into_iter()
                .map(|p| PortEntry {
                    port: p.port,
                    state: p.status.unwrap_or_else(|| "open".to_string()),
                })
                .collect(),
        }
    }
}

/// Accept a port written either as a number or as a string
fn port_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> Visitor<'de> for PortVisitor {
        type Value = u16;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a port number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u16, E> {
            u16::try_from(v).map_err(|_| E::custom(format!("port out of range: {}", v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u16, E> {
            u16::try_from(v).map_err(|_| E::custom(format!("port out of range: {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u16, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid port: {}", v)))
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

/// Read every record from a scanner JSON result file
pub fn read_scan_records(path: &Path) -> Result<Vec<ScanRecord>, ScanError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ScanError::ResultsNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let raw: Vec<RawRecord> =
        serde_json::from_str(&content).map_err(|source| ScanError::InvalidResults {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(raw.into_iter().map(ScanRecord::from).collect())
}

/// Load a scanner JSON result file into a registry
///
/// Only the first port of each record is consulted; records whose first
/// port is the bridge's well-known port are left out.
pub fn load_scan_results(path: &Path) -> Result<Registry, ScanError> {
    let records = read_scan_records(path)?;
    let mut registry = Registry::new();
    let added = registry.merge_records(&records);
    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        endpoints = added,
        "Loaded scan results"
    );
    Ok(registry)
}
