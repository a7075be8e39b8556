//! droidfleet: Command-line interface for fleets of Android devices
//!
//! Provides the `droidfleet` CLI: scanning networks for bridge endpoints,
//! keeping the endpoint registry, connecting to devices and broadcasting
//! commands to them.

pub mod commands;
pub mod context;
pub mod ipc;
pub mod output;
pub mod prompt;
