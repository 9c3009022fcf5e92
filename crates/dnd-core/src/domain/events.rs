//! Domain events handed to drag-source, drop-target and drag-detect listeners.
//!
//! Events are plain mutable records.  The reconciler fills them from the
//! client notification, dispatches them, and reads the fields back to see
//! what the listeners changed.

use serde::{Deserialize, Serialize};

use super::operation::{Feedback, Operation};
use super::transfer::{TransferData, TransferPayload};
use super::widget::{Point, WidgetId};

/// Left mouse button, the only button that starts a drag.
pub const DRAG_BUTTON: u32 = 1;

/// Sent to a control before a drag may start.  Listeners veto by clearing `doit`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragDetectEvent {
    pub control: WidgetId,
    /// Control-relative coordinates.
    pub x: i32,
    pub y: i32,
    pub time: i64,
    pub button: u32,
    pub doit: bool,
}

impl DragDetectEvent {
    pub fn new(control: WidgetId, point: Point, time: i64) -> Self {
        Self {
            control,
            x: point.x,
            y: point.y,
            time,
            button: DRAG_BUTTON,
            doit: true,
        }
    }
}

/// Kinds of events delivered to a drag source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragSourceEventKind {
    DragStart,
    DragSetData,
    DragFinished,
}

/// An event delivered to a drag source.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSourceEvent {
    pub kind: DragSourceEventKind,
    /// The control the drag source is attached to.
    pub source: WidgetId,
    pub x: i32,
    pub y: i32,
    pub time: i64,
    /// The operation performed (`DragFinished`) or `NONE`.
    pub detail: Operation,
    /// `DragStart`: clear to refuse the drag.  `DragSetData`: clear to refuse
    /// providing data.
    pub doit: bool,
    /// The type the drop target asked for (`DragSetData` only).
    pub data_type: Option<TransferData>,
    /// The payload supplied by a `DragSetData` listener.
    pub data: Option<TransferPayload>,
}

impl DragSourceEvent {
    pub fn new(kind: DragSourceEventKind, source: WidgetId, point: Point, time: i64) -> Self {
        Self {
            kind,
            source,
            x: point.x,
            y: point.y,
            time,
            detail: Operation::NONE,
            doit: true,
            data_type: None,
            data: None,
        }
    }
}

/// Kinds of events delivered to a drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropTargetEventKind {
    DragEnter,
    DragLeave,
    DragOperationChanged,
    DragOver,
    DropAccept,
    Drop,
}

/// An event delivered to a drop target.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTargetEvent {
    pub kind: DropTargetEventKind,
    /// The control the drop target is attached to.
    pub target: WidgetId,
    /// Display coordinates of the pointer.
    pub x: i32,
    pub y: i32,
    pub time: i64,
    /// The operation that would be performed.  Listeners may change it.
    pub detail: Operation,
    /// Operations allowed by both source and target.
    pub operations: Operation,
    pub feedback: Feedback,
    /// The type the drop would transfer.  Listeners may pick another entry of
    /// `data_types`.
    pub current_data_type: Option<TransferData>,
    pub data_types: Vec<TransferData>,
    /// The item (tree or table row) under the pointer, if any.
    pub item: Option<WidgetId>,
    /// The dropped payload (`Drop` only).
    pub data: Option<TransferPayload>,
}

impl DropTargetEvent {
    pub fn new(kind: DropTargetEventKind, target: WidgetId, point: Point, time: i64) -> Self {
        Self {
            kind,
            target,
            x: point.x,
            y: point.y,
            time,
            detail: Operation::NONE,
            operations: Operation::NONE,
            feedback: Feedback::NONE,
            current_data_type: None,
            data_types: Vec::new(),
            item: None,
            data: None,
        }
    }
}
