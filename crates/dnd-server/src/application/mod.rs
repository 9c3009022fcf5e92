//! Application layer use cases for drag-and-drop reconciliation.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules) and the infrastructure (files, CLI, storage).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a goal (e.g., "reconcile the
//!   drag notifications of this request against the server listeners").
//! - **Depend on abstractions** (traits such as `WidgetLookup`) rather than
//!   concrete implementations, so they can be tested with small fixtures.
//! - **Contain no file system access and no I/O**.
//!
//! # Sub-modules
//!
//! - **`sequence_phases`** – Decides the order in which the phases of a
//!   batch are reconciled.
//!
//! - **`publish_changes`** – Turns listener changes into override records for
//!   the next response.
//!
//! - **`reconcile`** – The per-phase state machine.  This is the core of the
//!   engine: it builds events, runs listeners, and diffs the result.
//!
//! - **`process_events`** – The [`process_events::DndEngine`] that owns the
//!   per-session drag state and drives a whole batch.
//!
//! - **`deferred_actions`** – The FIFO queue that runs reconciliation after
//!   the rest of a request.
//!
//! - **`ui_session`** – One client session: widget tree, engine and queue.
//!
//! - **`replay`** – Feeds a recorded list of requests through a session.

pub mod deferred_actions;
pub mod process_events;
pub mod publish_changes;
pub mod reconcile;
pub mod replay;
pub mod sequence_phases;
pub mod ui_session;
