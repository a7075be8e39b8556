//! Scripted in-memory bridge for tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use df_core::error::BridgeError;
use df_core::traits::{Bridge, InstallOptions, SessionStream};
use df_core::Session;
use df_protocol::Endpoint;

/// Scripted answer to one call
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    Timeout,
    Fail(String),
}

impl Reply {
    fn into_result(self, timeout: Duration) -> Result<String, BridgeError> {
        match self {
            Reply::Ok(s) => Ok(s),
            Reply::Timeout => Err(BridgeError::Timeout(timeout)),
            Reply::Fail(s) => Err(BridgeError::Failed(s)),
        }
    }
}

#[derive(Default)]
pub struct ScriptedBridge {
    pub connect: HashMap<String, Reply>,
    pub shell: HashMap<String, Reply>,
    pub sessions: Vec<Session>,
    pub updates: Vec<Session>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, endpoint: &str, reply: Reply) -> Self {
        self.connect.insert(endpoint.to_string(), reply);
        self
    }

    pub fn on_shell(mut self, serial: &str, reply: Reply) -> Self {
        self.shell.insert(serial.to_string(), reply);
        self
    }

    pub fn with_sessions(mut self, sessions: Vec<Session>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_updates(mut self, updates: Vec<Session>) -> Self {
        self.updates = updates;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Bridge for ScriptedBridge {
    async fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<String, BridgeError> {
        let key = endpoint.to_string();
        self.record(format!("connect {}", key));
        self.connect
            .get(&key)
            .cloned()
            .unwrap_or(Reply::Timeout)
            .into_result(timeout)
    }

    async fn disconnect(&self, serial: &str) -> Result<String, BridgeError> {
        self.record(format!("disconnect {}", serial));
        Ok(format!("disconnected {}", serial))
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, BridgeError> {
        self.record("list".to_string());
        Ok(self.sessions.clone())
    }

    async fn track_sessions(&self) -> Result<SessionStream, BridgeError> {
        self.record("track".to_string());
        let updates: Vec<Result<Session, BridgeError>> =
            self.updates.iter().cloned().map(Ok).collect();
        // Keep the stream open like a real tracking connection
        Ok(stream::iter(updates).chain(stream::pending()).boxed())
    }

    async fn shell(&self, serial: &str, command: &str) -> Result<String, BridgeError> {
        self.record(format!("shell {} {}", serial, command));
        self.shell
            .get(serial)
            .cloned()
            .unwrap_or_else(|| Reply::Fail(format!("device '{}' not found", serial)))
            .into_result(Duration::ZERO)
    }

    async fn install(
        &self,
        serial: &str,
        package: &Path,
        _options: InstallOptions,
    ) -> Result<String, BridgeError> {
        self.record(format!("install {} {}", serial, package.display()));
        Ok("Success".to_string())
    }

    async fn push(&self, serial: &str, local: &Path, remote: &str) -> Result<String, BridgeError> {
        self.record(format!("push {} {} {}", serial, local.display(), remote));
        Ok(String::new())
    }

    async fn pull(&self, serial: &str, remote: &str, local: &Path) -> Result<String, BridgeError> {
        self.record(format!("pull {} {} {}", serial, remote, local.display()));
        Ok(String::new())
    }
}
