//! Storage infrastructure: configuration and snapshot persistence.
//!
//! This module provides a thin adapter between the application and the
//! file system:
//!
//! - `config` reads and writes the TOML configuration file, falling back to
//!   defaults when the file does not exist yet.
//! - `snapshot` writes and reads the binary drag state of a session.

pub mod config;
pub mod snapshot;
