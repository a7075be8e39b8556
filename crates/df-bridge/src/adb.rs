//! ADB server bridge

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;

use df_core::config::BridgeConfig;
use df_core::error::BridgeError;
use df_core::traits::{validate_remote_path, Bridge, InstallOptions, SessionStream};
use df_core::Session;
use df_protocol::Endpoint;

use crate::tool::AdbTool;
use crate::wire::{self, DeviceListCodec};

/// Bridge backed by a running ADB server
#[derive(Debug, Clone)]
pub struct AdbBridge {
    server: String,
    tool: AdbTool,
    command_timeout: Duration,
}

impl AdbBridge {
    /// Create a bridge from configuration
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            server: config.server_address(),
            tool: AdbTool::from_config(config),
            command_timeout: config.command_timeout,
        }
    }

    /// Override the shell command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Address of the ADB server
    pub fn server(&self) -> &str {
        &self.server
    }

    async fn open(&self) -> Result<TcpStream, BridgeError> {
        TcpStream::connect(&self.server).await.map_err(|e| {
            tracing::debug!(server = %self.server, error = %e, "ADB server unreachable");
            BridgeError::Io(e)
        })
    }

    /// Send a host request and read its length-prefixed reply
    async fn host_query(&self, request: &str) -> Result<String, BridgeError> {
        let mut stream = self.open().await?;
        wire::send_request(&mut stream, request).await?;
        wire::read_status(&mut stream).await?;
        wire::read_prefixed(&mut stream).await
    }
}

#[async_trait]
impl Bridge for AdbBridge {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<String, BridgeError> {
        let request = format!("host:connect:{}", endpoint);
        match tokio::time::timeout(timeout, self.host_query(&request)).await {
            Ok(reply) => reply.map(|r| r.trim().to_string()),
            Err(_) => Err(BridgeError::Timeout(timeout)),
        }
    }

    async fn disconnect(&self, serial: &str) -> Result<String, BridgeError> {
        let reply = self
            .host_query(&format!("host:disconnect:{}", serial))
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, BridgeError> {
        let payload = self.host_query("host:devices").await?;
        Ok(wire::parse_devices(&payload))
    }

    async fn track_sessions(&self) -> Result<SessionStream, BridgeError> {
        let mut stream = self.open().await?;
        wire::send_request(&mut stream, "host:track-devices").await?;
        wire::read_status(&mut stream).await?;

        // Each frame is the full device list; devices missing from the
        // next frame are reported as absent.
        let updates = FramedRead::new(stream, DeviceListCodec)
            .scan(Vec::<Session>::new(), |previous, frame| {
                let batch: Vec<Result<Session, BridgeError>> = match frame {
                    Ok(current) => {
                        let mut batch: Vec<_> = wire::vanished(previous.as_slice(), &current)
                            .into_iter()
                            .map(Ok)
                            .collect();
                        batch.extend(current.iter().cloned().map(Ok));
                        *previous = current;
                        batch
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(stream::iter(batch)))
            })
            .flatten();

        Ok(updates.boxed())
    }

    async fn shell(&self, serial: &str, command: &str) -> Result<String, BridgeError> {
        let run = async {
            let mut stream = self.open().await?;
            wire::send_request(&mut stream, &format!("host:transport:{}", serial)).await?;
            wire::read_status(&mut stream).await?;
            wire::send_request(&mut stream, &format!("shell:{}", command)).await?;
            wire::read_status(&mut stream).await?;
            wire::read_to_close(&mut stream).await
        };

        match tokio::time::timeout(self.command_timeout, run).await {
            Ok(output) => output,
            Err(_) => {
                tracing::warn!(%serial, timeout = ?self.command_timeout, "Shell command timed out");
                Err(BridgeError::Timeout(self.command_timeout))
            }
        }
    }

    async fn install(
        &self,
        serial: &str,
        package: &Path,
        options: InstallOptions,
    ) -> Result<String, BridgeError> {
        if !package.is_file() {
            return Err(BridgeError::InvalidArgument(format!(
                "package not found: {}",
                package.display()
            )));
        }
        let mut args = vec![OsStr::new("install")];
        args.extend(options.flags().into_iter().map(OsStr::new));
        args.push(package.as_os_str());
        self.tool.run(serial, args).await
    }

    async fn push(&self, serial: &str, local: &Path, remote: &str) -> Result<String, BridgeError> {
        validate_remote_path(remote)?;
        if !local.exists() {
            return Err(BridgeError::InvalidArgument(format!(
                "local path not found: {}",
                local.display()
            )));
        }
        let args = [OsStr::new("push"), local.as_os_str(), OsStr::new(remote)];
        self.tool.run(serial, args).await
    }

    async fn pull(&self, serial: &str, remote: &str, local: &Path) -> Result<String, BridgeError> {
        validate_remote_path(remote)?;
        let args = [OsStr::new("pull"), OsStr::new(remote), local.as_os_str()];
        self.tool.run(serial, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> AdbBridge {
        AdbBridge::new(&BridgeConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            adb_path: "droidfleet-no-such-adb".to_string(),
            ..BridgeConfig::default()
        })
    }

    #[test]
    fn test_server_address() {
        assert_eq!(bridge().server(), "127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_push_rejects_relative_remote() {
        let result = bridge()
            .push("emulator-5554", Path::new("Cargo.toml"), "sdcard/Cargo.toml")
            .await;
        assert!(matches!(result, Err(BridgeError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_install_rejects_missing_package() {
        let result = bridge()
            .install(
                "emulator-5554",
                Path::new("/nonexistent/app.apk"),
                InstallOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(BridgeError::InvalidArgument(_))));
    }
}
