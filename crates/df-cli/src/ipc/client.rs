//! Registry daemon client

use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use df_core::config::DaemonConfig;
use df_protocol::{
    default_daemon_address, merge_batches, ClientCodec, Endpoint, RegistryRequest,
    RegistryResponse,
};

/// Default time allowed for connecting and for each reply
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the registry daemon
///
/// Requests are kept within the daemon's line limit; replies are read
/// without a limit since a listing grows with the registry.
pub struct RegistryClient {
    address: String,
    max_frame_len: usize,
    timeout: Duration,
}

impl RegistryClient {
    /// Create a new client with default address
    pub fn new() -> Self {
        Self::with_address(default_daemon_address())
    }

    /// Create a new client with custom address
    pub fn with_address(address: String) -> Self {
        Self {
            address,
            max_frame_len: df_protocol::DEFAULT_MAX_FRAME_LEN,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client from daemon configuration
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            address: config.address.clone(),
            max_frame_len: config.max_frame_len,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Get the address
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn open(&self) -> Result<Framed<TcpStream, ClientCodec>> {
        tracing::debug!("Connecting to registry daemon at {}", self.address);

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .with_context(|| format!("Timed out connecting to registry daemon at {}", self.address))?
            .with_context(|| {
                format!(
                    "Failed to connect to registry daemon at {}. Is it running?",
                    self.address
                )
            })?;

        Ok(Framed::new(stream, ClientCodec::unbounded()))
    }

    /// Send one request and wait for the reply
    ///
    /// Returns `None` if the daemon closed the connection without replying.
    async fn request(&self, request: RegistryRequest) -> Result<Option<RegistryResponse>> {
        let mut framed = self.open().await?;
        framed
            .send(request)
            .await
            .context("Failed to send request to registry daemon")?;

        match tokio::time::timeout(self.timeout, framed.next()).await {
            Ok(Some(Ok(response))) => Ok(Some(response)),
            Ok(Some(Err(e))) => Err(e).context("Invalid reply from registry daemon"),
            Ok(None) => Ok(None),
            Err(_) => anyhow::bail!("Timed out waiting for registry daemon at {}", self.address),
        }
    }

    /// Check if the daemon accepts connections
    pub async fn is_running(&self) -> bool {
        self.open().await.is_ok()
    }

    /// Fetch the shared registry
    pub async fn list(&self) -> Result<Vec<Endpoint>> {
        match self.request(RegistryRequest::List).await? {
            Some(RegistryResponse::Endpoints(endpoints)) => Ok(endpoints),
            Some(other) => anyhow::bail!("Unexpected response: {:?}", other),
            None => anyhow::bail!("Registry daemon closed the connection without replying"),
        }
    }

    /// Merge endpoints into the shared registry
    ///
    /// Large sets are sent as several requests that each fit the daemon's
    /// line limit. Returns `(added, total)` summed over all of them.
    pub async fn merge(&self, endpoints: Vec<Endpoint>) -> Result<(usize, usize)> {
        let batches = merge_batches(endpoints, self.max_frame_len);
        let count = batches.len();
        let mut added = 0;
        let mut total = 0;

        for (i, endpoints) in batches.into_iter().enumerate() {
            tracing::debug!("Merging batch {}/{} ({} endpoints)", i + 1, count, endpoints.len());
            match self.request(RegistryRequest::Merge { endpoints }).await? {
                Some(RegistryResponse::Merged {
                    added: batch_added,
                    total: batch_total,
                }) => {
                    added += batch_added;
                    total = batch_total;
                }
                Some(other) => anyhow::bail!("Unexpected response: {:?}", other),
                None => anyhow::bail!(
                    "Registry daemon closed the connection without acknowledging the merge"
                ),
            }
        }

        Ok((added, total))
    }

    /// Ask the daemon to shut down
    pub async fn stop(&self) -> Result<()> {
        match self.request(RegistryRequest::Stop).await? {
            Some(RegistryResponse::Stopping) | None => Ok(()),
            Some(other) => anyhow::bail!("Unexpected response: {:?}", other),
        }
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}
