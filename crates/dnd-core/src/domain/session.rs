//! UI sessions and the drag gestures running inside them.
//!
//! A client connection is a *session*.  All reconciliation state is scoped to
//! one session so two browsers dragging at the same time never see each
//! other's overrides.
//!
//! Inside a session, the [`GestureTracker`] remembers which drop target the
//! pointer is currently over for each drag source.  The engine needs this
//! when a batch reports `dragFinished` but the client never sent a
//! `dropAccept`: the last known target and operation are used to complete
//! the drop.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::operation::Operation;
use super::widget::WidgetId;

/// Identifies one client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One drag gesture in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub source: WidgetId,
    /// Drop target currently under the pointer.  `None` after a leave.
    pub target: Option<WidgetId>,
    /// Operations allowed between `source` and `target`.
    pub allowed_operations: Operation,
    /// Last operation reported to or decided for the current target.
    pub last_operation: Operation,
}

impl DragSession {
    pub fn new(source: WidgetId) -> Self {
        Self {
            source,
            target: None,
            allowed_operations: Operation::NONE,
            last_operation: Operation::NONE,
        }
    }
}

/// Gestures per session, keyed by drag source.
#[derive(Debug, Default)]
pub struct GestureTracker {
    sessions: HashMap<SessionId, HashMap<WidgetId, DragSession>>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh gesture for `source`, replacing any previous one.
    pub fn begin(&mut self, session: &SessionId, source: &WidgetId) -> &mut DragSession {
        let gesture = self
            .sessions
            .entry(*session)
            .or_default()
            .entry(source.clone())
            .or_insert_with(|| DragSession::new(source.clone()));
        *gesture = DragSession::new(source.clone());
        gesture
    }

    pub fn get(&self, session: &SessionId, source: &WidgetId) -> Option<&DragSession> {
        self.sessions.get(session)?.get(source)
    }

    /// Records that the pointer is over `target` with `operation`.
    ///
    /// Creates the gesture if the client skipped the start phase.
    pub fn touch(
        &mut self,
        session: &SessionId,
        source: &WidgetId,
        target: &WidgetId,
        allowed: Operation,
        operation: Operation,
    ) {
        let gesture = self
            .sessions
            .entry(*session)
            .or_default()
            .entry(source.clone())
            .or_insert_with(|| DragSession::new(source.clone()));
        gesture.target = Some(target.clone());
        gesture.allowed_operations = allowed;
        gesture.last_operation = operation;
    }

    /// Forgets the target of `source` if it is `target`.
    pub fn leave_target(&mut self, session: &SessionId, source: &WidgetId, target: &WidgetId) {
        let gesture = self.sessions.get_mut(session).and_then(|g| g.get_mut(source));
        if let Some(gesture) = gesture {
            if gesture.target.as_ref() == Some(target) {
                gesture.target = None;
                gesture.last_operation = Operation::NONE;
            }
        }
    }

    /// Ends the gesture of `source` and returns its last state.
    pub fn end(&mut self, session: &SessionId, source: &WidgetId) -> Option<DragSession> {
        let gestures = self.sessions.get_mut(session)?;
        let ended = gestures.remove(source);
        if gestures.is_empty() {
            self.sessions.remove(session);
        }
        ended
    }

    pub fn remove_session(&mut self, session: &SessionId) {
        self.sessions.remove(session);
    }

    /// All gestures of one session ordered by source id, for snapshots.
    pub fn session_gestures(&self, session: &SessionId) -> Vec<DragSession> {
        let mut gestures: Vec<_> = self
            .sessions
            .get(session)
            .map(|g| g.values().cloned().collect())
            .unwrap_or_default();
        gestures.sort_by(|a, b| a.source.cmp(&b.source));
        gestures
    }

    pub fn restore_session(&mut self, session: SessionId, gestures: Vec<DragSession>) {
        if gestures.is_empty() {
            self.sessions.remove(&session);
            return;
        }
        let gestures = gestures.into_iter().map(|g| (g.source.clone(), g)).collect();
        self.sessions.insert(session, gestures);
    }

    pub fn active_count(&self, session: &SessionId) -> usize {
        self.sessions.get(session).map_or(0, HashMap::len)
    }
}
