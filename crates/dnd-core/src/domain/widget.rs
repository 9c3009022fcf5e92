//! Session-scoped widget registry.
//!
//! The client refers to widgets by opaque string ids (`"w3"`).  The
//! [`WidgetTree`] maps those ids to widgets arranged under one or more shells
//! (top-level windows) and answers lookups with `Option`, so a notification
//! that names a disposed or unknown widget is simply not applicable.
//!
//! # Coordinates
//!
//! Each widget's bounds are relative to its parent; a shell's bounds are
//! relative to the display.  [`WidgetTree::map_to_control`] turns a display
//! point into a point relative to a given control by subtracting the
//! control's absolute origin.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::endpoints::{DragSource, DropTarget};
use super::events::DragDetectEvent;
use super::listeners::{ListenerId, ListenerTable};

/// Opaque widget id as used by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WidgetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle whose origin is relative to the parent widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetKind {
    /// A top-level window; the root of a widget tree.
    Shell,
    /// Any control that can carry a drag source or a drop target.
    Control,
    /// A row of a tree or table; reported as the `item` under the pointer.
    Item,
}

/// Errors raised while building a widget tree.
#[derive(Debug, Error, PartialEq)]
pub enum WidgetError {
    #[error("widget id already registered: {0}")]
    DuplicateId(WidgetId),

    #[error("parent widget not found: {0}")]
    ParentNotFound(WidgetId),

    #[error("widget not found: {0}")]
    NotFound(WidgetId),

    #[error("widget {0} is not a control")]
    NotAControl(WidgetId),

    #[error("control {0} already has a drag source")]
    AlreadyHasDragSource(WidgetId),

    #[error("control {0} already has a drop target")]
    AlreadyHasDropTarget(WidgetId),
}

/// A widget in the tree.
pub struct Widget {
    id: WidgetId,
    kind: WidgetKind,
    parent: Option<WidgetId>,
    bounds: Rectangle,
    drag_detect: ListenerTable<(), DragDetectEvent>,
    drag_source: Option<DragSource>,
    drop_target: Option<DropTarget>,
}

impl Widget {
    fn new(id: WidgetId, kind: WidgetKind, parent: Option<WidgetId>, bounds: Rectangle) -> Self {
        Self {
            id,
            kind,
            parent,
            bounds,
            drag_detect: ListenerTable::new(),
            drag_source: None,
            drop_target: None,
        }
    }

    pub fn id(&self) -> &WidgetId {
        &self.id
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&WidgetId> {
        self.parent.as_ref()
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rectangle) {
        self.bounds = bounds;
    }

    pub fn drag_source(&self) -> Option<&DragSource> {
        self.drag_source.as_ref()
    }

    pub fn drag_source_mut(&mut self) -> Option<&mut DragSource> {
        self.drag_source.as_mut()
    }

    pub fn drop_target(&self) -> Option<&DropTarget> {
        self.drop_target.as_ref()
    }

    pub fn drop_target_mut(&mut self) -> Option<&mut DropTarget> {
        self.drop_target.as_mut()
    }

    pub fn add_drag_detect_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&mut DragDetectEvent) + Send + Sync + 'static,
    {
        self.drag_detect.add((), listener)
    }

    pub fn notify_drag_detect(&self, event: &mut DragDetectEvent) -> usize {
        self.drag_detect.dispatch((), event)
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("bounds", &self.bounds)
            .field("drag_source", &self.drag_source)
            .field("drop_target", &self.drop_target)
            .finish()
    }
}

/// Lookup service used by the reconciler.
pub trait WidgetLookup {
    /// Returns the live widget with `id`, or `None` if it is unknown, disposed,
    /// or not attached to one of the session's shells.
    fn resolve(&self, id: &WidgetId) -> Option<&Widget>;

    /// Maps a display point into the coordinate space of `control`.
    ///
    /// Unknown controls leave the point unchanged.
    fn map_to_control(&self, control: &WidgetId, point: Point) -> Point;
}

/// Arena of widgets rooted at the shells of one session.
#[derive(Debug, Default)]
pub struct WidgetTree {
    shells: Vec<WidgetId>,
    widgets: HashMap<WidgetId, Widget>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shells(&self) -> &[WidgetId] {
        &self.shells
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Registers a top-level shell positioned in display coordinates.
    pub fn add_shell(&mut self, id: WidgetId, bounds: Rectangle) -> Result<(), WidgetError> {
        self.ensure_unused(&id)?;
        self.shells.push(id.clone());
        self.widgets
            .insert(id.clone(), Widget::new(id, WidgetKind::Shell, None, bounds));
        Ok(())
    }

    /// Registers a control under `parent` (a shell or another control).
    pub fn add_control(
        &mut self,
        id: WidgetId,
        parent: &WidgetId,
        bounds: Rectangle,
    ) -> Result<(), WidgetError> {
        self.add_child(id, WidgetKind::Control, parent, bounds)
    }

    /// Registers an item (tree or table row) under a control.
    pub fn add_item(&mut self, id: WidgetId, parent: &WidgetId) -> Result<(), WidgetError> {
        self.add_child(id, WidgetKind::Item, parent, Rectangle::default())
    }

    fn add_child(
        &mut self,
        id: WidgetId,
        kind: WidgetKind,
        parent: &WidgetId,
        bounds: Rectangle,
    ) -> Result<(), WidgetError> {
        self.ensure_unused(&id)?;
        match self.widgets.get(parent) {
            Some(p) if p.kind != WidgetKind::Item => {}
            Some(_) => return Err(WidgetError::NotAControl(parent.clone())),
            None => return Err(WidgetError::ParentNotFound(parent.clone())),
        }
        self.widgets
            .insert(id.clone(), Widget::new(id, kind, Some(parent.clone()), bounds));
        Ok(())
    }

    fn ensure_unused(&self, id: &WidgetId) -> Result<(), WidgetError> {
        if self.widgets.contains_key(id) {
            return Err(WidgetError::DuplicateId(id.clone()));
        }
        Ok(())
    }

    pub fn widget_mut(&mut self, id: &WidgetId) -> Option<&mut Widget> {
        self.widgets.get_mut(id)
    }

    /// Attaches a drag source to a control.  A control carries at most one.
    pub fn set_drag_source(
        &mut self,
        id: &WidgetId,
        source: DragSource,
    ) -> Result<(), WidgetError> {
        let widget = self.control_mut(id)?;
        if widget.drag_source.is_some() {
            return Err(WidgetError::AlreadyHasDragSource(id.clone()));
        }
        widget.drag_source = Some(source);
        Ok(())
    }

    /// Attaches a drop target to a control.  A control carries at most one.
    pub fn set_drop_target(
        &mut self,
        id: &WidgetId,
        target: DropTarget,
    ) -> Result<(), WidgetError> {
        let widget = self.control_mut(id)?;
        if widget.drop_target.is_some() {
            return Err(WidgetError::AlreadyHasDropTarget(id.clone()));
        }
        widget.drop_target = Some(target);
        Ok(())
    }

    fn control_mut(&mut self, id: &WidgetId) -> Result<&mut Widget, WidgetError> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| WidgetError::NotFound(id.clone()))?;
        if widget.kind != WidgetKind::Control {
            return Err(WidgetError::NotAControl(id.clone()));
        }
        Ok(widget)
    }

    /// Disposes `id` and every widget below it.  Returns the number removed.
    pub fn dispose(&mut self, id: &WidgetId) -> usize {
        if !self.widgets.contains_key(id) {
            return 0;
        }
        let mut doomed = vec![id.clone()];
        let mut index = 0;
        while index < doomed.len() {
            let current = doomed[index].clone();
            doomed.extend(
                self.widgets
                    .values()
                    .filter(|w| w.parent.as_ref() == Some(&current))
                    .map(|w| w.id.clone()),
            );
            index += 1;
        }
        for doomed_id in &doomed {
            self.widgets.remove(doomed_id);
        }
        self.shells.retain(|shell| !doomed.contains(shell));
        doomed.len()
    }

    /// Returns the shell at the root of `id`'s ancestor chain.
    fn root_of(&self, id: &WidgetId) -> Option<&WidgetId> {
        let mut current = self.widgets.get(id)?;
        // A depth bound guards against parent cycles.
        for _ in 0..=self.widgets.len() {
            match &current.parent {
                Some(parent) => current = self.widgets.get(parent)?,
                None => return Some(&current.id),
            }
        }
        None
    }

    /// Absolute (display) origin of `id`.
    fn display_origin(&self, id: &WidgetId) -> Option<Point> {
        let mut origin = Point::default();
        let mut current = self.widgets.get(id)?;
        for _ in 0..=self.widgets.len() {
            origin.x = origin.x.saturating_add(current.bounds.x);
            origin.y = origin.y.saturating_add(current.bounds.y);
            match &current.parent {
                Some(parent) => current = self.widgets.get(parent)?,
                None => return Some(origin),
            }
        }
        None
    }
}

impl WidgetLookup for WidgetTree {
    fn resolve(&self, id: &WidgetId) -> Option<&Widget> {
        let root = self.root_of(id)?;
        if !self.shells.contains(root) {
            return None;
        }
        self.widgets.get(id)
    }

    fn map_to_control(&self, control: &WidgetId, point: Point) -> Point {
        match self.display_origin(control) {
            Some(origin) => Point::new(
                point.x.saturating_sub(origin.x),
                point.y.saturating_sub(origin.y),
            ),
            None => point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::Operation;

    fn id(s: &str) -> WidgetId {
        WidgetId::from(s)
    }

    /// Shell w1 at (100, 50) → composite w2 at (10, 20) → list w3 at (5, 5) → item w4.
    fn make_tree() -> WidgetTree {
        let mut tree = WidgetTree::new();
        tree.add_shell(id("w1"), Rectangle::new(100, 50, 800, 600)).unwrap();
        tree.add_control(id("w2"), &id("w1"), Rectangle::new(10, 20, 400, 300))
            .unwrap();
        tree.add_control(id("w3"), &id("w2"), Rectangle::new(5, 5, 200, 100))
            .unwrap();
        tree.add_item(id("w4"), &id("w3")).unwrap();
        tree
    }

    #[test]
    fn test_resolve_finds_registered_widgets() {
        let tree = make_tree();

        assert_eq!(tree.resolve(&id("w3")).map(Widget::kind), Some(WidgetKind::Control));
        assert_eq!(tree.resolve(&id("w4")).map(Widget::kind), Some(WidgetKind::Item));
        assert!(tree.resolve(&id("w99")).is_none());
    }

    #[test]
    fn test_dispose_removes_subtree() {
        // Arrange
        let mut tree = make_tree();

        // Act
        let removed = tree.dispose(&id("w2"));

        // Assert
        assert_eq!(removed, 3);
        assert!(tree.resolve(&id("w2")).is_none());
        assert!(tree.resolve(&id("w4")).is_none());
        assert!(tree.resolve(&id("w1")).is_some());
    }

    #[test]
    fn test_disposing_shell_removes_it_from_shell_list() {
        let mut tree = make_tree();

        tree.dispose(&id("w1"));

        assert!(tree.shells().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_map_to_control_subtracts_absolute_origin() {
        let tree = make_tree();

        // w3 absolute origin = (100+10+5, 50+20+5) = (115, 75)
        let mapped = tree.map_to_control(&id("w3"), Point::new(120, 80));

        assert_eq!(mapped, Point::new(5, 5));
    }

    #[test]
    fn test_map_to_control_leaves_point_for_unknown_control() {
        let tree = make_tree();
        assert_eq!(tree.map_to_control(&id("nope"), Point::new(1, 2)), Point::new(1, 2));
    }

    #[test]
    fn test_map_to_control_follows_moved_control() {
        // Arrange
        let mut tree = make_tree();
        tree.widget_mut(&id("w2"))
            .expect("w2 exists")
            .set_bounds(Rectangle::new(40, 30, 400, 300));

        // Act: w3 absolute origin = (100+40+5, 50+30+5) = (145, 85)
        let mapped = tree.map_to_control(&id("w3"), Point::new(150, 90));

        // Assert
        assert_eq!(
            tree.resolve(&id("w2")).map(Widget::bounds),
            Some(Rectangle::new(40, 30, 400, 300))
        );
        assert_eq!(mapped, Point::new(5, 5));
    }

    #[test]
    fn test_map_to_control_saturates_extreme_coordinates() {
        let mut tree = make_tree();
        tree.add_control(id("w5"), &id("w1"), Rectangle::new(i32::MAX, i32::MIN, 10, 10))
            .unwrap();

        let low = tree.map_to_control(&id("w3"), Point::new(i32::MIN, i32::MIN));
        let high = tree.map_to_control(&id("w3"), Point::new(i32::MAX, 5));
        let far = tree.map_to_control(&id("w5"), Point::new(0, 0));

        assert_eq!(low, Point::new(i32::MIN, i32::MIN));
        assert_eq!(high, Point::new(i32::MAX - 115, 5 - 75));
        assert_eq!(far, Point::new(-i32::MAX, i32::MAX - 49));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut tree = make_tree();
        assert_eq!(
            tree.add_control(id("w3"), &id("w1"), Rectangle::default()),
            Err(WidgetError::DuplicateId(id("w3")))
        );
    }

    #[test]
    fn test_children_of_items_are_rejected() {
        let mut tree = make_tree();
        assert_eq!(
            tree.add_item(id("w5"), &id("w4")),
            Err(WidgetError::NotAControl(id("w4")))
        );
        assert_eq!(
            tree.add_item(id("w5"), &id("missing")),
            Err(WidgetError::ParentNotFound(id("missing")))
        );
    }

    #[test]
    fn test_control_carries_at_most_one_drag_source() {
        let mut tree = make_tree();
        tree.set_drag_source(&id("w3"), DragSource::new(Operation::COPY))
            .unwrap();

        let second = tree.set_drag_source(&id("w3"), DragSource::new(Operation::MOVE));

        assert_eq!(second, Err(WidgetError::AlreadyHasDragSource(id("w3"))));
    }

    #[test]
    fn test_drop_target_cannot_be_attached_to_shell_or_item() {
        let mut tree = make_tree();
        assert_eq!(
            tree.set_drop_target(&id("w1"), DropTarget::new(Operation::COPY)),
            Err(WidgetError::NotAControl(id("w1")))
        );
        assert_eq!(
            tree.set_drop_target(&id("w4"), DropTarget::new(Operation::COPY)),
            Err(WidgetError::NotAControl(id("w4")))
        );
    }
}
