//! dnd-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the `dnd-replay` binary in `main.rs` share the same module tree.
//!
//! - `application` holds the reconciliation engine and the session loop.
//! - `infrastructure` loads fixtures and configuration and writes snapshots.

pub mod application;
pub mod infrastructure;
