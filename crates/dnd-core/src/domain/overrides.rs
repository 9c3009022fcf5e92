//! Listener-driven overrides of client-reported drag state.
//!
//! When a listener changes the operation, the feedback, or the data type of
//! a drop-target event, the client must be corrected in the next response.
//! The change is stored as an *override* on the drag source's record.  Until
//! it is cleared, an override takes precedence over whatever the client
//! reports for that field in the following phases.
//!
//! ```text
//! OverrideStore
//!   └─ SessionId ──► source WidgetId ──► OverrideRecord
//!                                          ├─ operation : Option<Override<Operation>>
//!                                          ├─ feedback  : Option<Override<Feedback>>
//!                                          ├─ data_type : Option<Override<TransferData>>
//!                                          └─ cancelled : bool
//! ```
//!
//! Records are created on the first override and removed at drag end.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::operation::{Feedback, Operation};
use super::session::SessionId;
use super::transfer::TransferData;
use super::widget::WidgetId;

/// One overridden value and the drop-target control that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override<T> {
    pub control: WidgetId,
    pub value: T,
}

/// Pending overrides for one drag source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub operation: Option<Override<Operation>>,
    pub feedback: Option<Override<Feedback>>,
    pub data_type: Option<Override<TransferData>>,
    /// Set when DragStart listeners refused the drag.
    pub cancelled: bool,
}

impl OverrideRecord {
    pub fn operation(&self) -> Option<Operation> {
        self.operation.as_ref().map(|o| o.value)
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback.as_ref().map(|o| o.value)
    }

    pub fn data_type(&self) -> Option<TransferData> {
        self.data_type.as_ref().map(|o| o.value)
    }

    /// Returns `true` if no override is set and the drag is not cancelled.
    pub fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.feedback.is_none()
            && self.data_type.is_none()
            && !self.cancelled
    }
}

/// Per-session, per-source override records.
#[derive(Debug, Default)]
pub struct OverrideStore {
    sessions: HashMap<SessionId, HashMap<WidgetId, OverrideRecord>>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, session: &SessionId, source: &WidgetId) -> Option<&OverrideRecord> {
        self.sessions.get(session)?.get(source)
    }

    fn record_mut(&mut self, session: &SessionId, source: &WidgetId) -> &mut OverrideRecord {
        self.sessions
            .entry(*session)
            .or_default()
            .entry(source.clone())
            .or_default()
    }

    pub fn set_operation(
        &mut self,
        session: &SessionId,
        source: &WidgetId,
        control: &WidgetId,
        value: Operation,
    ) {
        self.record_mut(session, source).operation = Some(Override {
            control: control.clone(),
            value,
        });
    }

    pub fn set_feedback(
        &mut self,
        session: &SessionId,
        source: &WidgetId,
        control: &WidgetId,
        value: Feedback,
    ) {
        self.record_mut(session, source).feedback = Some(Override {
            control: control.clone(),
            value,
        });
    }

    pub fn set_data_type(
        &mut self,
        session: &SessionId,
        source: &WidgetId,
        control: &WidgetId,
        value: TransferData,
    ) {
        self.record_mut(session, source).data_type = Some(Override {
            control: control.clone(),
            value,
        });
    }

    pub fn cancel_operation(&mut self, session: &SessionId, source: &WidgetId) {
        self.update_existing(session, source, |record| record.operation = None);
    }

    pub fn cancel_feedback(&mut self, session: &SessionId, source: &WidgetId) {
        self.update_existing(session, source, |record| record.feedback = None);
    }

    pub fn cancel_data_type(&mut self, session: &SessionId, source: &WidgetId) {
        self.update_existing(session, source, |record| record.data_type = None);
    }

    fn update_existing(
        &mut self,
        session: &SessionId,
        source: &WidgetId,
        update: impl FnOnce(&mut OverrideRecord),
    ) {
        if let Some(record) = self.sessions.get_mut(session).and_then(|s| s.get_mut(source)) {
            update(record);
        }
    }

    /// Marks the gesture of `source` as refused.
    pub fn cancel_drag(&mut self, session: &SessionId, source: &WidgetId) {
        self.record_mut(session, source).cancelled = true;
    }

    pub fn is_cancelled(&self, session: &SessionId, source: &WidgetId) -> bool {
        self.record(session, source).map_or(false, |record| record.cancelled)
    }

    /// Clears every override and the cancel flag of `source`.
    pub fn clear(&mut self, session: &SessionId, source: &WidgetId) {
        if let Some(records) = self.sessions.get_mut(session) {
            records.remove(source);
            if records.is_empty() {
                self.sessions.remove(session);
            }
        }
    }

    /// Drops every record of a session (session end).
    pub fn remove_session(
        &mut self,
        session: &SessionId,
    ) -> Option<HashMap<WidgetId, OverrideRecord>> {
        self.sessions.remove(session)
    }

    /// All records of one session, for snapshots.
    pub fn session_records(&self, session: &SessionId) -> Vec<(WidgetId, OverrideRecord)> {
        let mut records: Vec<_> = self
            .sessions
            .get(session)
            .map(|records| records.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    /// Replaces every record of a session.
    pub fn restore_session(
        &mut self,
        session: SessionId,
        records: Vec<(WidgetId, OverrideRecord)>,
    ) {
        let records: HashMap<_, _> = records.into_iter().filter(|(_, r)| !r.is_empty()).collect();
        if records.is_empty() {
            self.sessions.remove(&session);
        } else {
            self.sessions.insert(session, records);
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

// ── Deltas ────────────────────────────────────────────────────────────────────

/// The three reconciled fields of a drop-target event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventState {
    pub operation: Operation,
    pub feedback: Feedback,
    pub data_type: Option<TransferData>,
}

/// Fields whose value after the listeners differs from the value they were handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
    pub operation: Option<Operation>,
    pub feedback: Option<Feedback>,
    /// `Some(None)` means the listeners cleared the data type.
    pub data_type: Option<Option<TransferData>>,
}

impl Delta {
    pub fn between(before: &EventState, after: &EventState) -> Self {
        Self {
            operation: (before.operation != after.operation).then_some(after.operation),
            feedback: (before.feedback != after.feedback).then_some(after.feedback),
            data_type: (before.data_type != after.data_type).then_some(after.data_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operation.is_none() && self.feedback.is_none() && self.data_type.is_none()
    }
}
