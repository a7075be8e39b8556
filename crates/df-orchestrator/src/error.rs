//! Orchestration errors

use df_core::error::BridgeError;
use thiserror::Error;

/// Errors that abort a whole batch
///
/// Per-endpoint and per-device failures never surface here; they are
/// recorded in the batch report instead.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Broadcast command is empty
    #[error("Command must not be empty")]
    EmptyCommand,

    /// The bridge could not be queried
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}
