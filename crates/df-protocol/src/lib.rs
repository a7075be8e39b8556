//! df-protocol: Wire protocol for the droidfleet registry daemon
//!
//! This crate defines the endpoint type shared by every component and the
//! newline-delimited text protocol spoken between the CLI and the registry
//! daemon.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;

pub use codec::{ClientCodec, LineCodec, ServerCodec, WireMessage};
pub use endpoint::{Endpoint, BRIDGE_DEFAULT_PORT};
pub use error::ProtocolError;
pub use message::{
    default_daemon_address, merge_batches, RegistryRequest, RegistryResponse, DEFAULT_DAEMON_PORT,
    DEFAULT_MAX_FRAME_LEN,
};
