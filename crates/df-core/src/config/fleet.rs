//! Fleet configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use df_protocol::{default_daemon_address, DEFAULT_MAX_FRAME_LEN};

use super::serde_utils::{duration_millis, duration_secs};

/// Configuration shared by the CLI and the registry daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Device-bridge server settings
    pub bridge: BridgeConfig,

    /// Per-endpoint connect timeout in milliseconds
    #[serde(rename = "connect_timeout_ms", with = "duration_millis")]
    pub connect_timeout: Duration,

    /// Number of bridge operations allowed in flight (1 = sequential)
    pub max_parallel: usize,

    /// Registry daemon settings
    pub daemon: DaemonConfig,

    /// Port scanner settings
    pub scanner: ScannerConfig,

    /// Override for the registry cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            connect_timeout: Duration::from_secs(2),
            max_parallel: 1,
            daemon: DaemonConfig::default(),
            scanner: ScannerConfig::default(),
            cache_dir: None,
        }
    }
}

impl FleetConfig {
    /// Directory holding the registry cache
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(super::default_cache_dir)
    }

    /// Parallelism window, never below one
    pub fn parallelism(&self) -> usize {
        self.max_parallel.max(1)
    }
}

/// Device-bridge (ADB server) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host of the ADB server
    pub host: String,

    /// Port of the ADB server
    pub port: u16,

    /// Path of the `adb` executable used for file transfer and install
    pub adb_path: String,

    /// Longest a single shell command may run on a device
    #[serde(rename = "command_timeout_secs", with = "duration_secs")]
    pub command_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5037,
            adb_path: "adb".to_string(),
            command_timeout: Duration::from_secs(60),
        }
    }
}

impl BridgeConfig {
    /// Address of the ADB server (host:port)
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Registry daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address the daemon listens on and clients connect to
    pub address: String,

    /// Maximum request line length in bytes
    pub max_frame_len: usize,

    /// How long the daemon waits for a client's request line
    #[serde(rename = "read_timeout_secs", with = "duration_secs")]
    pub read_timeout: Duration,

    /// How long the daemon waits for a client to take its reply
    #[serde(rename = "write_timeout_secs", with = "duration_secs")]
    pub write_timeout: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            address: default_daemon_address(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Port scanner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Scanner executable
    pub program: String,

    /// File the scanner writes its JSON results to
    pub output_file: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            program: "masscan".to_string(),
            output_file: PathBuf::from("devices.json"),
        }
    }
}
