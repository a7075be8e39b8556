//! Broadcast command dispatcher

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use df_core::{Bridge, CommandResult, Session, SessionStatus};

use crate::error::OrchestratorError;

/// Aggregated results of a broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// One result per targeted session, in input order
    pub results: Vec<CommandResult>,
    /// Number of sessions targeted
    pub attempted: usize,
    /// Sessions where the command ran
    pub succeeded: usize,
    /// Sessions where the command could not be run
    pub failed: usize,
}

impl DispatchReport {
    fn from_results(results: Vec<CommandResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            attempted: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Whether any device printed something
    pub fn has_output(&self) -> bool {
        self.results.iter().any(CommandResult::has_output)
    }
}

/// Outcome of a broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No session was ready; nothing ran
    NoDevices,
    /// The command was sent to every ready session
    Completed(DispatchReport),
}

/// Fans a shell command out to ready sessions
pub struct CommandDispatcher {
    bridge: Arc<dyn Bridge>,
    max_parallel: usize,
}

impl CommandDispatcher {
    /// Create a dispatcher running one device at a time
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self {
            bridge,
            max_parallel: 1,
        }
    }

    /// Allow up to `max_parallel` devices in flight
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Run `command` on every session of `sessions` in `DEVICE` state
    pub async fn dispatch(
        &self,
        command: &str,
        sessions: &[Session],
    ) -> Result<DispatchOutcome, OrchestratorError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(OrchestratorError::EmptyCommand);
        }

        let targets: Vec<&Session> = sessions
            .iter()
            .filter(|s| s.present && s.status == SessionStatus::Device)
            .collect();
        if targets.is_empty() {
            tracing::info!("No ready devices for broadcast");
            return Ok(DispatchOutcome::NoDevices);
        }

        tracing::info!(command, devices = targets.len(), "Broadcasting command");

        let results: Vec<CommandResult> = stream::iter(targets)
            .map(|session| async move {
                match self.bridge.shell(&session.serial, command).await {
                    Ok(output) => CommandResult::success(&session.serial, output),
                    Err(e) => {
                        tracing::warn!(serial = %session.serial, error = %e, "Command failed");
                        CommandResult::failure(&session.serial, e.to_string())
                    }
                }
            })
            .buffered(self.max_parallel)
            .collect()
            .await;

        Ok(DispatchOutcome::Completed(DispatchReport::from_results(
            results,
        )))
    }

    /// Snapshot the bridge and run `command` on every ready session
    pub async fn broadcast(&self, command: &str) -> Result<DispatchOutcome, OrchestratorError> {
        if command.trim().is_empty() {
            return Err(OrchestratorError::EmptyCommand);
        }
        let sessions = self.bridge.list_sessions().await?;
        self.dispatch(command, &sessions).await
    }
}
