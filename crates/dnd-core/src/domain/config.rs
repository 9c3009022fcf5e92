//! Behaviour switches for the reconciliation engine.
//!
//! These live in the core crate so the engine can be configured without the
//! server's TOML layer.  The server embeds this struct as the `[engine]`
//! section of its config file.

use serde::{Deserialize, Serialize};

/// Engine behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// When the client reports a data type no endpoint pair supports, use the
    /// first negotiated candidate instead of no type at all.
    #[serde(default = "default_true")]
    pub data_type_fallback: bool,
    /// Complete a drop against the last known target when a batch reports
    /// `dragFinished` without a `dropAccept`.
    #[serde(default = "default_true")]
    pub synthesize_drop_on_finish: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_type_fallback: default_true(),
            synthesize_drop_on_finish: default_true(),
        }
    }
}
