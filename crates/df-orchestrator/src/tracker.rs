//! Fleet status tracker

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;

use df_core::error::BridgeError;
use df_core::{Bridge, Session, SessionStatus};

/// Observes the sessions held by the bridge
pub struct FleetTracker {
    bridge: Arc<dyn Bridge>,
}

impl FleetTracker {
    /// Create a tracker over `bridge`
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge }
    }

    /// Current sessions in one batched query
    pub async fn snapshot(&self) -> Result<Vec<Session>, BridgeError> {
        let sessions = self.bridge.list_sessions().await?;
        tracing::debug!(count = sessions.len(), "Fleet snapshot");
        Ok(sessions)
    }

    /// Current sessions with the given status
    pub async fn get_by_status(&self, status: SessionStatus) -> Result<Vec<Session>, BridgeError> {
        Ok(self
            .snapshot()
            .await?
            .into_iter()
            .filter(|s| s.status == status)
            .collect())
    }

    /// Sessions ready for commands
    pub async fn ready(&self) -> Result<Vec<Session>, BridgeError> {
        self.get_by_status(SessionStatus::Device).await
    }

    /// Follow the tracking stream for `window` and return the latest
    /// state of every serial seen, sorted by serial
    pub async fn watch(&self, window: Duration) -> Result<Vec<Session>, BridgeError> {
        let mut updates = self.bridge.track_sessions().await?;
        let deadline = Instant::now() + window;
        let mut latest: BTreeMap<String, Session> = BTreeMap::new();

        loop {
            match tokio::time::timeout_at(deadline, updates.next()).await {
                Ok(Some(Ok(session))) => {
                    latest.insert(session.serial.clone(), session);
                }
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Session tracking stream failed");
                    return Err(e);
                }
                // Stream closed or window elapsed
                Ok(None) | Err(_) => break,
            }
        }

        Ok(latest.into_values().collect())
    }
}
