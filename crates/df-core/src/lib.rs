//! df-core: Core abstractions and configuration for droidfleet
//!
//! This crate provides the endpoint registry and its on-disk cache, the
//! scanner output parser, the device-bridge trait and the configuration
//! structures used by the orchestrator, daemon, and CLI components.

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod scan;
pub mod traits;
pub mod types;

pub use cache::RegistryCache;
pub use df_protocol::{Endpoint, BRIDGE_DEFAULT_PORT};
pub use error::DfError;
pub use registry::Registry;
pub use traits::Bridge;
pub use types::{CommandResult, PortEntry, ScanRecord, Session, SessionStatus};
