//! Drag sources and drop targets attached to controls.

use std::fmt;
use std::sync::Arc;

use super::events::{DragSourceEvent, DragSourceEventKind, DropTargetEvent, DropTargetEventKind};
use super::listeners::{ListenerId, ListenerTable};
use super::operation::Operation;
use super::transfer::Transfer;

/// Makes a control draggable.
pub struct DragSource {
    /// Operations this source allows.
    style: Operation,
    transfers: Vec<Arc<dyn Transfer>>,
    listeners: ListenerTable<DragSourceEventKind, DragSourceEvent>,
}

impl DragSource {
    pub fn new(style: Operation) -> Self {
        Self {
            style,
            transfers: Vec::new(),
            listeners: ListenerTable::new(),
        }
    }

    pub fn with_transfers(mut self, transfers: Vec<Arc<dyn Transfer>>) -> Self {
        self.transfers = transfers;
        self
    }

    pub fn style(&self) -> Operation {
        self.style
    }

    pub fn transfers(&self) -> &[Arc<dyn Transfer>] {
        &self.transfers
    }

    pub fn set_transfers(&mut self, transfers: Vec<Arc<dyn Transfer>>) {
        self.transfers = transfers;
    }

    pub fn add_listener<F>(&mut self, kind: DragSourceEventKind, listener: F) -> ListenerId
    where
        F: Fn(&mut DragSourceEvent) + Send + Sync + 'static,
    {
        self.listeners.add(kind, listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Dispatches `event` to the listeners registered for its kind.
    pub fn notify(&self, event: &mut DragSourceEvent) -> usize {
        self.listeners.dispatch(event.kind, event)
    }
}

impl fmt::Debug for DragSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragSource")
            .field("style", &self.style)
            .field("transfers", &self.transfers.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Makes a control accept drops.
pub struct DropTarget {
    style: Operation,
    transfers: Vec<Arc<dyn Transfer>>,
    listeners: ListenerTable<DropTargetEventKind, DropTargetEvent>,
}

impl DropTarget {
    pub fn new(style: Operation) -> Self {
        Self {
            style,
            transfers: Vec::new(),
            listeners: ListenerTable::new(),
        }
    }

    pub fn with_transfers(mut self, transfers: Vec<Arc<dyn Transfer>>) -> Self {
        self.transfers = transfers;
        self
    }

    pub fn style(&self) -> Operation {
        self.style
    }

    pub fn transfers(&self) -> &[Arc<dyn Transfer>] {
        &self.transfers
    }

    pub fn set_transfers(&mut self, transfers: Vec<Arc<dyn Transfer>>) {
        self.transfers = transfers;
    }

    pub fn add_listener<F>(&mut self, kind: DropTargetEventKind, listener: F) -> ListenerId
    where
        F: Fn(&mut DropTargetEvent) + Send + Sync + 'static,
    {
        self.listeners.add(kind, listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn notify(&self, event: &mut DropTargetEvent) -> usize {
        self.listeners.dispatch(event.kind, event)
    }
}

impl fmt::Debug for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropTarget")
            .field("style", &self.style)
            .field("transfers", &self.transfers.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Operations allowed for a gesture from `source` onto `target`.
pub fn allowed_operations(source: &DragSource, target: &DropTarget) -> Operation {
    source.style() & target.style()
}
