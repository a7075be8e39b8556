//! Scan target validation

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::ScanError;

/// A validated network and port specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    network: String,
    ports: String,
    ipv6: bool,
}

impl ScanTarget {
    /// Validate a network (`a.b.c.d/m`) and port spec (`5555,5037-5040`)
    pub fn new(
        network: impl Into<String>,
        ports: impl Into<String>,
        ipv6: bool,
    ) -> Result<Self, ScanError> {
        let network = network.into().trim().to_string();
        let ports = ports.into().trim().to_string();
        validate_network(&network, ipv6)?;
        validate_ports(&ports)?;
        Ok(Self {
            network,
            ports,
            ipv6,
        })
    }

    /// Network in CIDR notation
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Port specification
    pub fn ports(&self) -> &str {
        &self.ports
    }

    /// Whether the network is IPv6
    pub fn is_ipv6(&self) -> bool {
        self.ipv6
    }
}

/// Check a CIDR network specification
pub fn validate_network(network: &str, ipv6: bool) -> Result<(), ScanError> {
    let invalid = || ScanError::InvalidNetwork(network.to_string());

    let (address, mask) = network.split_once('/').ok_or_else(invalid)?;
    let mask: u8 = mask.parse().map_err(|_| invalid())?;

    let max_mask = if ipv6 {
        address.parse::<Ipv6Addr>().map_err(|_| invalid())?;
        128
    } else {
        address.parse::<Ipv4Addr>().map_err(|_| invalid())?;
        32
    };

    if mask > max_mask {
        return Err(invalid());
    }
    Ok(())
}

/// Check a comma-separated port specification
pub fn validate_ports(ports: &str) -> Result<(), ScanError> {
    let invalid = || ScanError::InvalidPorts(ports.to_string());

    if ports.is_empty() {
        return Err(invalid());
    }

    for item in ports.split(',') {
        let item = item.trim();
        let (low, high) = match item.split_once('-') {
            Some((low, high)) => (parse_port(low), parse_port(high)),
            None => (parse_port(item), parse_port(item)),
        };
        match (low, high) {
            (Some(low), Some(high)) if low <= high => {}
            _ => return Err(invalid()),
        }
    }
    Ok(())
}

fn parse_port(s: &str) -> Option<u16> {
    s.trim().parse::<u16>().ok().filter(|p| *p != 0)
}
