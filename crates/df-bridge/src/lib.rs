//! df-bridge: Device-bridge client for droidfleet
//!
//! Implements [`df_core::Bridge`] on top of a local ADB server. Session
//! management and shell commands speak the ADB host protocol directly;
//! file transfer and package installation run the `adb` executable.

pub mod adb;
pub mod tool;
pub mod wire;

pub use adb::AdbBridge;
pub use tool::AdbTool;
