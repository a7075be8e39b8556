//! Connection orchestrator
//!
//! Opens one bridge session per registry endpoint. Each attempt is bounded
//! by the configured timeout; a failing endpoint is recorded and the batch
//! moves on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use df_core::error::BridgeError;
use df_core::{Bridge, Registry, Session, SessionStatus};
use df_protocol::Endpoint;

/// Reply fragments the bridge uses for a refused connection
pub const FAILURE_MARKERS: [&str; 3] = ["failed", "unable", "already"];

/// Why a connection attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    /// The attempt ran past the timeout
    Timeout,
    /// The bridge answered with a refusal
    Rejected(String),
    /// The bridge could not be asked
    Bridge(String),
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectFailure::Timeout => write!(f, "timed out"),
            ConnectFailure::Rejected(reply) => write!(f, "rejected: {}", reply),
            ConnectFailure::Bridge(error) => write!(f, "bridge error: {}", error),
        }
    }
}

/// Result of a connection batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectReport {
    /// Number of endpoints tried
    pub attempted: usize,
    /// Endpoints with a session, in input order
    pub connected: Vec<Endpoint>,
    /// Endpoints without a session, in input order
    pub failed: Vec<(Endpoint, ConnectFailure)>,
}

impl ConnectReport {
    /// Whether at least one endpoint connected
    pub fn any_connected(&self) -> bool {
        !self.connected.is_empty()
    }

    /// Whether every attempted endpoint connected
    pub fn all_connected(&self) -> bool {
        self.attempted > 0 && self.failed.is_empty()
    }
}

/// Result of disconnecting the ready sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectReport {
    /// Serials that were disconnected
    pub disconnected: Vec<String>,
    /// Serials the bridge refused to disconnect, with the reason
    pub failed: Vec<(String, String)>,
}

/// Whether a connect reply reports a refusal
pub fn is_failure_reply(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Establishes bridge sessions for registry endpoints
pub struct ConnectionOrchestrator {
    bridge: Arc<dyn Bridge>,
    timeout: Duration,
    max_parallel: usize,
}

impl ConnectionOrchestrator {
    /// Create an orchestrator running one attempt at a time
    pub fn new(bridge: Arc<dyn Bridge>, timeout: Duration) -> Self {
        Self {
            bridge,
            timeout,
            max_parallel: 1,
        }
    }

    /// Allow up to `max_parallel` attempts in flight
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Try every endpoint in the registry
    pub async fn connect_all(&self, registry: &Registry) -> ConnectReport {
        self.connect_endpoints(registry.iter().cloned()).await
    }

    /// Try a single explicit endpoint
    pub async fn connect_one(&self, endpoint: &Endpoint) -> ConnectReport {
        self.connect_endpoints(std::iter::once(endpoint.clone())).await
    }

    /// Try a sequence of endpoints, reporting in input order
    pub async fn connect_endpoints<I>(&self, endpoints: I) -> ConnectReport
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let outcomes: Vec<(Endpoint, Result<String, ConnectFailure>)> =
            stream::iter(endpoints)
                .map(|endpoint| async move {
                    let outcome = self.attempt(&endpoint).await;
                    (endpoint, outcome)
                })
                .buffered(self.max_parallel)
                .collect()
                .await;

        let mut report = ConnectReport {
            attempted: outcomes.len(),
            ..Default::default()
        };
        for (endpoint, outcome) in outcomes {
            match outcome {
                Ok(_) => report.connected.push(endpoint),
                Err(failure) => report.failed.push((endpoint, failure)),
            }
        }

        tracing::info!(
            attempted = report.attempted,
            connected = report.connected.len(),
            failed = report.failed.len(),
            "Connection batch finished"
        );
        report
    }

    async fn attempt(&self, endpoint: &Endpoint) -> Result<String, ConnectFailure> {
        match self.bridge.connect(endpoint, self.timeout).await {
            Ok(reply) if is_failure_reply(&reply) => {
                tracing::debug!(%endpoint, %reply, "Connection refused");
                Err(ConnectFailure::Rejected(reply))
            }
            Ok(reply) => {
                tracing::debug!(%endpoint, %reply, "Connected");
                Ok(reply)
            }
            Err(BridgeError::Timeout(_)) => {
                tracing::debug!(%endpoint, "Connection timed out");
                Err(ConnectFailure::Timeout)
            }
            Err(e) => {
                tracing::debug!(%endpoint, error = %e, "Connection failed");
                Err(ConnectFailure::Bridge(e.to_string()))
            }
        }
    }

    /// Disconnect every session in `DEVICE` state
    pub async fn disconnect_ready(&self, sessions: &[Session]) -> DisconnectReport {
        let mut report = DisconnectReport::default();
        for session in sessions
            .iter()
            .filter(|s| s.present && s.status == SessionStatus::Device)
        {
            match self.bridge.disconnect(&session.serial).await {
                Ok(reply) if is_failure_reply(&reply) || reply.contains("error") => {
                    report.failed.push((session.serial.clone(), reply));
                }
                Ok(_) => report.disconnected.push(session.serial.clone()),
                Err(e) => report.failed.push((session.serial.clone(), e.to_string())),
            }
        }
        report
    }
}
