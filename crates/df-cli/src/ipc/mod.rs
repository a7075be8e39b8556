//! Client for the registry daemon
//!
//! Uses TCP on localhost; every call opens its own connection.

mod client;

pub use client::RegistryClient;
