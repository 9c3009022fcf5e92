//! Domain entities for drag-and-drop reconciliation.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from network libraries, file systems, or UI toolkits.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the domain describes what a drag gesture *is*: controls that can be
//! dragged from or dropped onto ([`endpoints`]), the operations they allow
//! ([`operation`]), the data formats they can exchange ([`transfer`]), the
//! events listeners receive ([`events`]), and the overrides listeners leave
//! behind for the client ([`overrides`]).
//!
//! The application layer in `dnd-server` drives these types once per request.

/// Engine behaviour switches.
pub mod config;

/// [`endpoints::DragSource`] and [`endpoints::DropTarget`].
pub mod endpoints;

/// Events handed to listeners.
pub mod events;

/// Ordered listener tables.
pub mod listeners;

/// Operation and feedback bit sets.
pub mod operation;

/// Per-source override records and deltas.
pub mod overrides;

/// Session ids and live drag gestures.
pub mod session;

/// Transfer types and data-type negotiation.
pub mod transfer;

/// Widget registry and coordinate mapping.
pub mod widget;
