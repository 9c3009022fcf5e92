//! Typed view of the drag-and-drop notifications in one client message.
//!
//! The client reports the latest notification per drag phase once per round
//! trip.  [`NotifyBatch::from_message`] picks those notifications out of a
//! [`ClientMessage`] and parses their string properties into a [`Phase`],
//! a tagged union with one variant per phase name.
//!
//! Parsing never fails.  Unparseable numbers read as `0`, unknown operation
//! names read as [`Operation::NONE`], and a `dataType` of `"null"` reads as
//! no type at all.

use serde::{Deserialize, Serialize};

use crate::domain::operation::{Feedback, Operation};
use crate::domain::transfer::TransferData;
use crate::domain::widget::{Point, WidgetId};
use crate::protocol::message::{ClientMessage, NotifyOperation};

// ── Property names ────────────────────────────────────────────────────────────

pub const PROP_X: &str = "x";
pub const PROP_Y: &str = "y";
pub const PROP_TIME: &str = "time";
pub const PROP_OPERATION: &str = "operation";
pub const PROP_FEEDBACK: &str = "feedback";
pub const PROP_DATA_TYPE: &str = "dataType";
pub const PROP_ITEM: &str = "item";
pub const PROP_SOURCE: &str = "source";

/// The seven drag phases the client reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhaseKind {
    Start,
    Enter,
    OperationChanged,
    Over,
    Leave,
    DropAccept,
    Finished,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 7] = [
        PhaseKind::Start,
        PhaseKind::Enter,
        PhaseKind::OperationChanged,
        PhaseKind::Over,
        PhaseKind::Leave,
        PhaseKind::DropAccept,
        PhaseKind::Finished,
    ];

    /// The notify event name on the wire.
    pub fn event_name(self) -> &'static str {
        match self {
            PhaseKind::Start => "dragStart",
            PhaseKind::Enter => "dragEnter",
            PhaseKind::OperationChanged => "dragOperationChanged",
            PhaseKind::Over => "dragOver",
            PhaseKind::Leave => "dragLeave",
            PhaseKind::DropAccept => "dropAccept",
            PhaseKind::Finished => "dragFinished",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.event_name() == name)
    }
}

/// Parsed properties of one notification.
///
/// `target` is the widget the notification was sent for: the drag source
/// control for `Start` and `Finished`, the drop target control otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseProps {
    pub target: WidgetId,
    /// Display coordinates.
    pub x: i32,
    pub y: i32,
    pub time: i64,
    /// Operation as reported by the client.
    pub operation: Operation,
    pub feedback: Feedback,
    pub data_type: Option<TransferData>,
    pub item: Option<WidgetId>,
    /// Drag source control; present on drop-target phases.
    pub source: Option<WidgetId>,
}

impl PhaseProps {
    pub fn new(target: impl Into<WidgetId>) -> Self {
        Self {
            target: target.into(),
            x: 0,
            y: 0,
            time: 0,
            operation: Operation::NONE,
            feedback: Feedback::NONE,
            data_type: None,
            item: None,
            source: None,
        }
    }

    /// Parses the properties of a notify operation.
    pub fn from_notify(notify: &NotifyOperation) -> Self {
        let int = |name: &str| parse_int(notify.property(name).as_deref());
        let data_type = notify
            .property(PROP_DATA_TYPE)
            .filter(|value| value != "null")
            .map(|value| TransferData::new(parse_int(Some(value.as_str()))));
        Self {
            target: notify.target().clone(),
            x: int(PROP_X),
            y: int(PROP_Y),
            time: parse_i64(notify.property(PROP_TIME).as_deref()),
            operation: Operation::from_client_value(notify.property(PROP_OPERATION).as_deref()),
            feedback: Feedback::from_client_value(int(PROP_FEEDBACK)),
            data_type,
            item: notify.property(PROP_ITEM).map(WidgetId::from),
            source: notify.property(PROP_SOURCE).map(WidgetId::from),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_data_type(mut self, data_type: Option<TransferData>) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_item(mut self, item: impl Into<WidgetId>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<WidgetId>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// One drag notification, tagged by phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "props")]
pub enum Phase {
    Start(PhaseProps),
    Enter(PhaseProps),
    OperationChanged(PhaseProps),
    Over(PhaseProps),
    Leave(PhaseProps),
    DropAccept(PhaseProps),
    Finished(PhaseProps),
}

impl Phase {
    pub fn new(kind: PhaseKind, props: PhaseProps) -> Self {
        match kind {
            PhaseKind::Start => Phase::Start(props),
            PhaseKind::Enter => Phase::Enter(props),
            PhaseKind::OperationChanged => Phase::OperationChanged(props),
            PhaseKind::Over => Phase::Over(props),
            PhaseKind::Leave => Phase::Leave(props),
            PhaseKind::DropAccept => Phase::DropAccept(props),
            PhaseKind::Finished => Phase::Finished(props),
        }
    }

    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Start(_) => PhaseKind::Start,
            Phase::Enter(_) => PhaseKind::Enter,
            Phase::OperationChanged(_) => PhaseKind::OperationChanged,
            Phase::Over(_) => PhaseKind::Over,
            Phase::Leave(_) => PhaseKind::Leave,
            Phase::DropAccept(_) => PhaseKind::DropAccept,
            Phase::Finished(_) => PhaseKind::Finished,
        }
    }

    pub fn props(&self) -> &PhaseProps {
        match self {
            Phase::Start(p)
            | Phase::Enter(p)
            | Phase::OperationChanged(p)
            | Phase::Over(p)
            | Phase::Leave(p)
            | Phase::DropAccept(p)
            | Phase::Finished(p) => p,
        }
    }
}

/// The drag notifications of one request, at most one per phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyBatch {
    phases: Vec<Phase>,
}

impl NotifyBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the last notification of every drag phase in `message`.
    pub fn from_message(message: &ClientMessage) -> Self {
        let mut batch = Self::new();
        for kind in PhaseKind::ALL {
            if let Some(notify) = message.last_notify_operation_for(None, kind.event_name()) {
                batch.insert(Phase::new(kind, PhaseProps::from_notify(notify)));
            }
        }
        batch
    }

    /// Adds `phase`, replacing an earlier record of the same kind.
    pub fn insert(&mut self, phase: Phase) {
        let kind = phase.kind();
        match self.phases.iter_mut().find(|p| p.kind() == kind) {
            Some(existing) => *existing = phase,
            None => self.phases.push(phase),
        }
    }

    /// Builder form of [`NotifyBatch::insert`].
    pub fn with(mut self, kind: PhaseKind, props: PhaseProps) -> Self {
        self.insert(Phase::new(kind, props));
        self
    }

    pub fn get(&self, kind: PhaseKind) -> Option<&Phase> {
        self.phases.iter().find(|p| p.kind() == kind)
    }

    pub fn props(&self, kind: PhaseKind) -> Option<&PhaseProps> {
        self.get(kind).map(Phase::props)
    }

    pub fn contains(&self, kind: PhaseKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

// ── Lenient number parsing ────────────────────────────────────────────────────

/// Parses an integer property.
///
/// Accepts integers, then decimal numbers (rounded half away from zero and
/// saturated to the `i32` range).  Anything else, including an absent value,
/// yields `0`.
pub fn parse_int(value: Option<&str>) -> i32 {
    let Some(value) = value else {
        return 0;
    };
    if let Ok(parsed) = value.parse::<i32>() {
        return parsed;
    }
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => parsed.round() as i32,
        _ => 0,
    }
}

/// Like [`parse_int`] but for timestamps, which may exceed `i32`.
pub fn parse_i64(value: Option<&str>) -> i64 {
    let Some(value) = value else {
        return 0;
    };
    if let Ok(parsed) = value.parse::<i64>() {
        return parsed;
    }
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => parsed.round() as i64,
        _ => 0,
    }
}
