//! Registry daemon server
//!
//! Connections are served one after another: accept, read one request
//! line, answer, close. The registry is owned by the accept loop, so no
//! locking is involved. Anything that is not a valid request is dropped
//! without a reply.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use df_core::config::DaemonConfig;
use df_core::error::CacheError;
use df_core::{Registry, RegistryCache};
use df_protocol::{RegistryRequest, RegistryResponse, ServerCodec};

/// Settings of a running daemon
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    /// Address to bind
    pub address: String,
    /// Maximum request length in bytes
    pub max_frame_len: usize,
    /// How long to wait for a client's request
    pub read_timeout: Duration,
    /// How long to wait for a client to take the reply
    pub write_timeout: Duration,
}

impl From<&DaemonConfig> for DaemonSettings {
    fn from(config: &DaemonConfig) -> Self {
        Self {
            address: config.address.clone(),
            max_frame_len: config.max_frame_len,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self::from(&DaemonConfig::default())
    }
}

/// Apply one request to the registry
///
/// Returns the response and whether the daemon should stop.
pub fn process_request(
    request: RegistryRequest,
    registry: &mut Registry,
) -> (RegistryResponse, bool) {
    match request {
        RegistryRequest::List => (RegistryResponse::Endpoints(registry.to_vec()), false),
        RegistryRequest::Merge { endpoints } => {
            let added = registry.merge(endpoints);
            (
                RegistryResponse::Merged {
                    added,
                    total: registry.len(),
                },
                false,
            )
        }
        RegistryRequest::Stop => (RegistryResponse::Stopping, true),
    }
}

/// Load the cache, starting empty if it is missing or unreadable
pub fn seed_registry(cache: &RegistryCache) -> Registry {
    match cache.load() {
        Ok(registry) => {
            tracing::info!(endpoints = registry.len(), "Seeded registry from cache");
            registry
        }
        Err(CacheError::NotFound(_)) => {
            tracing::info!("No registry cache, starting empty");
            Registry::new()
        }
        Err(e) => {
            tracing::warn!("Ignoring registry cache: {}", e);
            Registry::new()
        }
    }
}

/// Sequential TCP server holding the shared registry
pub struct RegistryDaemon {
    settings: DaemonSettings,
    registry: Registry,
    shutdown_token: Option<CancellationToken>,
}

impl RegistryDaemon {
    /// Create a daemon with an empty registry
    pub fn new(settings: DaemonSettings) -> Self {
        Self {
            settings,
            registry: Registry::new(),
            shutdown_token: None,
        }
    }

    /// Start from an existing registry
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the shutdown token (call before run)
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = Some(token);
        self
    }

    /// Bind the configured address and serve until stopped
    ///
    /// Returns the registry as it was when the daemon stopped.
    pub async fn run(self) -> Result<Registry> {
        let listener = TcpListener::bind(&self.settings.address)
            .await
            .with_context(|| format!("Failed to bind registry daemon to {}", self.settings.address))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until stopped
    pub async fn serve(mut self, listener: TcpListener) -> Result<Registry> {
        let local = listener
            .local_addr()
            .context("Failed to read daemon address")?;
        tracing::info!(
            address = %local,
            endpoints = self.registry.len(),
            "Registry daemon listening"
        );

        let shutdown = self.shutdown_token.clone().unwrap_or_default();

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "Accepted connection");
                    if self.handle_connection(stream).await {
                        tracing::info!("Stop requested by client");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            }
        }

        drop(listener);
        tracing::info!(endpoints = self.registry.len(), "Registry daemon stopped");
        Ok(self.registry)
    }

    /// Serve one connection; returns true if the daemon should stop
    async fn handle_connection(&mut self, stream: TcpStream) -> bool {
        let codec = ServerCodec::with_max_length(self.settings.max_frame_len);
        let mut framed = Framed::new(stream, codec);

        let request = match tokio::time::timeout(self.settings.read_timeout, framed.next()).await
        {
            Ok(Some(Ok(request))) => request,
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "Dropping malformed request");
                return false;
            }
            Ok(None) => {
                tracing::debug!("Client closed without a request");
                return false;
            }
            Err(_) => {
                tracing::debug!(timeout = ?self.settings.read_timeout, "Client sent nothing in time");
                return false;
            }
        };

        tracing::debug!(?request, "Handling request");
        let (response, stop) = process_request(request, &mut self.registry);

        let write_timeout = self.settings.write_timeout;
        match tokio::time::timeout(write_timeout, framed.send(response)).await {
            Ok(Ok(())) => {}
            // The client may close before reading the reply
            Ok(Err(e)) => tracing::debug!(error = %e, "Failed to send response"),
            Err(_) => tracing::debug!(timeout = ?write_timeout, "Client did not take the reply in time"),
        }
        stop
    }
}
