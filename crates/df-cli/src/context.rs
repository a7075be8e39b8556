//! Per-invocation state shared by the commands

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use df_bridge::AdbBridge;
use df_core::config::{self, FleetConfig};
use df_core::{Bridge, RegistryCache};
use df_orchestrator::{CommandDispatcher, ConnectionOrchestrator, FleetTracker};

use crate::ipc::RegistryClient;

/// Loaded configuration plus the handles built from it
pub struct FleetContext {
    config: FleetConfig,
    config_path: Option<PathBuf>,
    bridge: Arc<dyn Bridge>,
}

impl FleetContext {
    /// Load configuration and build the bridge
    ///
    /// An explicit `config_path` must exist; the default location may be
    /// missing, in which case defaults are used.
    pub fn load(config_path: Option<&Path>, daemon_override: Option<String>) -> Result<Self> {
        let mut config: FleetConfig = match config_path {
            Some(path) => config::load_config(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?,
            None => {
                let default_path = config::default_config_path();
                config::load_config_or_default(&default_path).unwrap_or_else(|e| {
                    tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                    FleetConfig::default()
                })
            }
        };

        if let Some(address) = daemon_override {
            config.daemon.address = address;
        }

        Ok(Self::from_config(config, config_path.map(Path::to_path_buf)))
    }

    /// Build a context around an already loaded configuration
    pub fn from_config(config: FleetConfig, config_path: Option<PathBuf>) -> Self {
        let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new(&config.bridge));
        Self {
            config,
            config_path,
            bridge,
        }
    }

    /// Loaded configuration
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Config file given on the command line, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Device bridge
    pub fn bridge(&self) -> Arc<dyn Bridge> {
        Arc::clone(&self.bridge)
    }

    /// Local registry cache
    pub fn cache(&self) -> RegistryCache {
        RegistryCache::new(self.config.cache_dir())
    }

    /// Client for the registry daemon
    pub fn daemon_client(&self) -> RegistryClient {
        RegistryClient::from_config(&self.config.daemon)
    }

    /// Orchestrator that connects endpoints with the configured timeout
    /// and parallelism
    pub fn connector(&self) -> ConnectionOrchestrator {
        ConnectionOrchestrator::new(self.bridge(), self.config.connect_timeout)
            .with_max_parallel(self.config.parallelism())
    }

    /// Runs shell commands across devices
    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(self.bridge()).with_max_parallel(self.config.parallelism())
    }

    /// Watches device sessions through the bridge
    pub fn tracker(&self) -> FleetTracker {
        FleetTracker::new(self.bridge())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_handles_follow_config() {
        let mut config = FleetConfig::default();
        config.connect_timeout = Duration::from_millis(750);
        config.daemon.address = "127.0.0.1:41000".to_string();

        let ctx = FleetContext::from_config(config, None);
        assert_eq!(ctx.connector().timeout(), Duration::from_millis(750));
        assert_eq!(ctx.daemon_client().address(), "127.0.0.1:41000");
        assert!(ctx.config_path().is_none());
    }
}
