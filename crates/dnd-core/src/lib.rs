//! # dnd-core
//!
//! Shared library for server-side drag and drop: domain entities, data-type
//! negotiation, and the typed view of the client's drag notifications.
//!
//! It has no I/O.  The reconciliation use cases that drive these types live in
//! the `dnd-server` crate.
//!
//! # Architecture overview (for beginners)
//!
//! In a thin-client UI toolkit the browser performs the actual drag gesture
//! and only *reports* what happened: "the pointer entered widget w7 while
//! dragging from w2 with operation MOVE".  Application code, however, lives on
//! the server and registers listeners on drag sources and drop targets.  Those
//! listeners may change their mind ("no, this is a COPY"), and the client must
//! learn about that on the next round trip.
//!
//! This crate (`dnd-core`) defines:
//!
//! - **`domain`** – Operations, feedback, transfers, widgets, the events
//!   listeners receive, and the per-session override records that carry
//!   listener decisions back to the client.
//!
//! - **`protocol`** – Decoding of the JSON request message and the
//!   [`NotifyBatch`]: at most one typed [`Phase`] per drag phase.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `dnd_core::Operation` instead of `dnd_core::domain::operation::Operation`.
pub use domain::config::EngineConfig;
pub use domain::endpoints::{allowed_operations, DragSource, DropTarget};
pub use domain::events::{
    DragDetectEvent, DragSourceEvent, DragSourceEventKind, DropTargetEvent, DropTargetEventKind,
};
pub use domain::operation::{check_operation, Feedback, Operation};
pub use domain::overrides::{Delta, EventState, OverrideRecord, OverrideStore};
pub use domain::session::{DragSession, GestureTracker, SessionId};
pub use domain::transfer::{
    check_data_type, determine_data_types, find_transfer_by_type, Transfer, TransferData,
    TransferPayload,
};
pub use domain::widget::{
    Point, Rectangle, WidgetError, WidgetId, WidgetKind, WidgetLookup, WidgetTree,
};
pub use protocol::message::{ClientMessage, NotifyOperation, ProtocolError};
pub use protocol::notify::{NotifyBatch, Phase, PhaseKind, PhaseProps};
