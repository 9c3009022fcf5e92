//! Infrastructure layer for the dnd-replay tool.
//!
//! Contains file-system facing adapters: widget fixtures loaded from JSON,
//! the TOML configuration file and binary session snapshots.
//!
//! **Dependency rule**: this layer may depend on `application` and `dnd_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod fixture;
pub mod storage;
