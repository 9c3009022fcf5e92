//! DndEngine: reconciles the drag notifications of one request.
//!
//! The engine owns all drag state that outlives a single request, keyed by
//! session:
//!
//! - the [`OverrideStore`] (listener decisions the client has not seen yet),
//! - the [`GestureTracker`] (which target each drag source is over).
//!
//! [`DndEngine::process_batch`] runs the phases of a [`NotifyBatch`] in the
//! order given by [`sequence_phases`] and returns a [`RoundTripReport`].

use dnd_core::domain::config::EngineConfig;
use dnd_core::domain::operation::Operation;
use dnd_core::domain::overrides::{OverrideRecord, OverrideStore};
use dnd_core::domain::session::{DragSession, GestureTracker, SessionId};
use dnd_core::domain::widget::{WidgetId, WidgetLookup};
use dnd_core::protocol::message::ClientMessage;
use dnd_core::protocol::notify::{NotifyBatch, PhaseKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::application::publish_changes::ChangePublisher;
use crate::application::reconcile::{PhaseReconciler, RoundTripReport};
use crate::application::sequence_phases::sequence_phases;

/// Serializable drag state of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: SessionId,
    pub overrides: Vec<(WidgetId, OverrideRecord)>,
    pub gestures: Vec<DragSession>,
}

/// The drag-and-drop reconciliation engine.
#[derive(Debug, Default)]
pub struct DndEngine {
    config: EngineConfig,
    overrides: OverrideStore,
    gestures: GestureTracker,
}

impl DndEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            overrides: OverrideStore::new(),
            gestures: GestureTracker::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub fn gestures(&self) -> &GestureTracker {
        &self.gestures
    }

    /// Reconciles the drag notifications contained in `message`.
    pub fn process_message(
        &mut self,
        session: &SessionId,
        widgets: &dyn WidgetLookup,
        message: &ClientMessage,
    ) -> RoundTripReport {
        let batch = NotifyBatch::from_message(message);
        self.process_batch(session, widgets, &batch)
    }

    /// Reconciles every phase present in `batch`.
    ///
    /// Phases that cannot be reconciled are recorded as skipped; the pass
    /// always runs to the end.
    pub fn process_batch(
        &mut self,
        session: &SessionId,
        widgets: &dyn WidgetLookup,
        batch: &NotifyBatch,
    ) -> RoundTripReport {
        let order = sequence_phases(batch);
        trace!(%session, ?order, "processing drag batch");

        let config = self.config;
        let publisher = ChangePublisher::new(&mut self.overrides, *session, config);
        let mut reconciler =
            PhaseReconciler::new(*session, config, widgets, publisher, &mut self.gestures);
        let mut report = RoundTripReport::default();
        let mut operation = Operation::NONE;

        for kind in order {
            let Some(props) = batch.props(kind) else {
                continue;
            };
            let result = match kind {
                PhaseKind::Start => reconciler.start(props),
                PhaseKind::Enter => reconciler.enter(props),
                PhaseKind::OperationChanged | PhaseKind::Over => reconciler.track(kind, props),
                PhaseKind::Leave => reconciler.leave(props),
                PhaseKind::DropAccept => reconciler.drop_accept(props).map(|op| operation = op),
                PhaseKind::Finished => {
                    if config.synthesize_drop_on_finish && !batch.contains(PhaseKind::DropAccept) {
                        if let Some(accept) = reconciler.synthesized_drop_props(props) {
                            let synthesized =
                                reconciler.drop_accept(&accept).map(|op| operation = op);
                            report.record(PhaseKind::DropAccept, true, synthesized);
                        }
                    }
                    report.final_operation = Some(operation);
                    reconciler.finished(props, operation)
                }
            };
            if let Err(reason) = &result {
                debug!(%session, ?kind, %reason, "phase skipped");
            }
            report.record(kind, false, result);
        }

        report.pending_overrides = self.overrides.session_records(session);
        report
    }

    /// Drops all drag state of a session.
    pub fn end_session(&mut self, session: &SessionId) {
        self.overrides.remove_session(session);
        self.gestures.remove_session(session);
    }

    pub fn export_session(&self, session: &SessionId) -> SessionSnapshot {
        SessionSnapshot {
            session: *session,
            overrides: self.overrides.session_records(session),
            gestures: self.gestures.session_gestures(session),
        }
    }

    /// Replaces the drag state of `snapshot.session` with the snapshot's.
    pub fn import_session(&mut self, snapshot: SessionSnapshot) {
        self.overrides
            .restore_session(snapshot.session, snapshot.overrides);
        self.gestures
            .restore_session(snapshot.session, snapshot.gestures);
    }
}
