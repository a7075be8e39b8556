//! Device-bridge trait

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;
use std::time::Duration;

use crate::error::BridgeError;
use crate::types::Session;
use df_protocol::Endpoint;

/// Live stream of session updates from the bridge
///
/// The stream ends when the bridge closes the tracking connection.
pub type SessionStream = BoxStream<'static, Result<Session, BridgeError>>;

/// Flags for package installation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Replace an existing installation (`-r`)
    pub replace: bool,
    /// Allow version downgrade (`-d`)
    pub allow_downgrade: bool,
    /// Grant every runtime permission (`-g`)
    pub grant_permissions: bool,
    /// Allow test packages (`-t`)
    pub allow_test: bool,
}

impl InstallOptions {
    /// Flags in the order the bridge tool expects them
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.replace {
            flags.push("-r");
        }
        if self.allow_downgrade {
            flags.push("-d");
        }
        if self.grant_permissions {
            flags.push("-g");
        }
        if self.allow_test {
            flags.push("-t");
        }
        flags
    }
}

/// Abstraction over the device bridge
///
/// Implementations own every session; callers only observe them through
/// [`Bridge::list_sessions`] and [`Bridge::track_sessions`].
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Open a network session to `endpoint`
    ///
    /// Returns the bridge's textual reply. A reply is not necessarily a
    /// success: the bridge reports refusals such as "failed to connect"
    /// as ordinary replies.
    async fn connect(&self, endpoint: &Endpoint, timeout: Duration)
        -> Result<String, BridgeError>;

    /// Close the session identified by `serial`
    async fn disconnect(&self, serial: &str) -> Result<String, BridgeError>;

    /// Snapshot of every session the bridge currently knows
    async fn list_sessions(&self) -> Result<Vec<Session>, BridgeError>;

    /// Stream of session state changes
    async fn track_sessions(&self) -> Result<SessionStream, BridgeError>;

    /// Run a shell command and capture its output
    async fn shell(&self, serial: &str, command: &str) -> Result<String, BridgeError>;

    /// Install a package file
    async fn install(
        &self,
        serial: &str,
        package: &Path,
        options: InstallOptions,
    ) -> Result<String, BridgeError>;

    /// Copy a local file to the device
    async fn push(&self, serial: &str, local: &Path, remote: &str)
        -> Result<String, BridgeError>;

    /// Copy a file from the device
    async fn pull(&self, serial: &str, remote: &str, local: &Path)
        -> Result<String, BridgeError>;
}

/// Reject remote paths the device would resolve relative to its cwd
pub fn validate_remote_path(remote: &str) -> Result<(), BridgeError> {
    if remote.starts_with('/') {
        Ok(())
    } else {
        Err(BridgeError::InvalidArgument(format!(
            "remote path must be absolute: {}",
            remote
        )))
    }
}
