//! Client protocol: the JSON request message and the drag notifications in it.

pub mod message;
pub mod notify;

pub use message::{ClientMessage, ClientOperation, NotifyOperation, ProtocolError};
pub use notify::{parse_i64, parse_int, NotifyBatch, Phase, PhaseKind, PhaseProps};
