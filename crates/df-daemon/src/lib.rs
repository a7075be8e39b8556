//! df-daemon: Registry daemon for droidfleet
//!
//! The daemon keeps one endpoint registry in memory and serves it over
//! localhost TCP so that several CLI invocations can share discovery
//! results without scanning again.

pub mod server;
pub mod signal;

pub use server::{process_request, seed_registry, DaemonSettings, RegistryDaemon};
pub use signal::shutdown_on_signal;
