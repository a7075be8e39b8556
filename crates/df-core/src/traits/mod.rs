//! Core trait definitions

mod bridge;

pub use bridge::{validate_remote_path, Bridge, InstallOptions, SessionStream};
