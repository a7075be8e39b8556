//! df-orchestrator: Fleet orchestration engine for droidfleet
//!
//! Turns a registry of endpoints into bridge sessions, observes the
//! sessions the bridge holds, and broadcasts shell commands to every
//! ready device. All work goes through a shared [`df_core::Bridge`].

pub mod connector;
pub mod dispatcher;
pub mod error;
pub mod tracker;

#[cfg(test)]
mod mock;

pub use connector::{ConnectFailure, ConnectReport, ConnectionOrchestrator, DisconnectReport};
pub use dispatcher::{CommandDispatcher, DispatchOutcome, DispatchReport};
pub use error::OrchestratorError;
pub use tracker::FleetTracker;
