//! PhaseReconciler: reconciles one drag phase against the server listeners.
//!
//! For every phase the reconciler
//!
//! 1. resolves the widgets the notification names,
//! 2. builds the domain event, preferring pending overrides over the values
//!    the client reported (the client has not seen them yet),
//! 3. runs the listeners,
//! 4. diffs what the listeners left behind and publishes the difference
//!    through the [`ChangePublisher`].
//!
//! A phase that cannot be reconciled (unknown widget, no drag source, a
//! cancelled gesture, ...) is skipped with a [`SkipReason`].  Skipping never
//! aborts the rest of the batch.

use dnd_core::domain::config::EngineConfig;
use dnd_core::domain::endpoints::{allowed_operations, DragSource, DropTarget};
use dnd_core::domain::events::{
    DragDetectEvent, DragSourceEvent, DragSourceEventKind, DropTargetEvent, DropTargetEventKind,
};
use dnd_core::domain::operation::{check_operation, Feedback, Operation};
use dnd_core::domain::overrides::{Delta, EventState, OverrideRecord};
use dnd_core::domain::session::{GestureTracker, SessionId};
use dnd_core::domain::transfer::{
    check_data_type, determine_data_types, find_transfer_by_type, TransferData, TransferPayload,
};
use dnd_core::domain::widget::{WidgetId, WidgetLookup};
use dnd_core::protocol::notify::{PhaseKind, PhaseProps};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::publish_changes::ChangePublisher;

/// Why a phase was not reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "widget", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("widget {0} is unknown or disposed")]
    MissingWidget(WidgetId),

    #[error("widget {0} has no drag source")]
    NotADragSource(WidgetId),

    #[error("widget {0} has no drop target")]
    NotADropTarget(WidgetId),

    #[error("notification does not name a drag source")]
    MissingSource,

    #[error("drag from {0} was cancelled")]
    Cancelled(WidgetId),
}

// ── Round-trip report ─────────────────────────────────────────────────────────

/// What happened to one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseOutcome {
    pub kind: PhaseKind,
    /// `true` for a drop accept the engine completed on the client's behalf.
    pub synthesized: bool,
    pub skipped: Option<SkipReason>,
}

/// Result of reconciling one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundTripReport {
    /// Processed phases, in processing order.
    pub phases: Vec<PhaseOutcome>,
    /// Operation reported to the drag-end listeners, if the gesture finished.
    pub final_operation: Option<Operation>,
    /// Overrides the next response must carry to the client.
    pub pending_overrides: Vec<(WidgetId, OverrideRecord)>,
}

impl RoundTripReport {
    pub fn record(&mut self, kind: PhaseKind, synthesized: bool, result: Result<(), SkipReason>) {
        self.phases.push(PhaseOutcome {
            kind,
            synthesized,
            skipped: result.err(),
        });
    }

    pub fn outcome(&self, kind: PhaseKind) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|outcome| outcome.kind == kind)
    }

    /// Kinds of the phases whose listeners were reached.
    pub fn reconciled(&self) -> Vec<PhaseKind> {
        self.phases
            .iter()
            .filter(|outcome| outcome.skipped.is_none())
            .map(|outcome| outcome.kind)
            .collect()
    }
}

// ── Reconciler ────────────────────────────────────────────────────────────────

/// A resolved drag source / drop target pair.
struct Pairing<'a> {
    source_id: WidgetId,
    source: &'a DragSource,
    target: &'a DropTarget,
    allowed: Operation,
    valid_types: Vec<TransferData>,
}

/// Reconciles the phases of one batch for one session.
pub struct PhaseReconciler<'a> {
    session: SessionId,
    config: EngineConfig,
    widgets: &'a dyn WidgetLookup,
    publisher: ChangePublisher<'a>,
    gestures: &'a mut GestureTracker,
}

impl<'a> PhaseReconciler<'a> {
    pub fn new(
        session: SessionId,
        config: EngineConfig,
        widgets: &'a dyn WidgetLookup,
        publisher: ChangePublisher<'a>,
        gestures: &'a mut GestureTracker,
    ) -> Self {
        Self {
            session,
            config,
            widgets,
            publisher,
            gestures,
        }
    }

    // ── Phases ────────────────────────────────────────────────────────────────

    /// DragStart: drag-detect listeners, then drag-start listeners.
    ///
    /// Overrides left over from an earlier gesture of the same source are
    /// dropped first.  A veto from either listener chain cancels the gesture.
    pub fn start(&mut self, props: &PhaseProps) -> Result<(), SkipReason> {
        let source_id = &props.target;
        self.publisher.reset(source_id);
        self.gestures.begin(&self.session, source_id);

        let widgets = self.widgets;
        let widget = widgets
            .resolve(source_id)
            .ok_or_else(|| SkipReason::MissingWidget(source_id.clone()))?;
        let source = widget
            .drag_source()
            .ok_or_else(|| SkipReason::NotADragSource(source_id.clone()))?;

        let mapped = widgets.map_to_control(source_id, props.point());
        let mut detect = DragDetectEvent::new(source_id.clone(), mapped, props.time);
        widget.notify_drag_detect(&mut detect);
        if !detect.doit {
            info!(source = %source_id, "drag detect vetoed");
            self.publisher.cancel(source_id);
            return Ok(());
        }

        let mut start = DragSourceEvent::new(
            DragSourceEventKind::DragStart,
            source_id.clone(),
            mapped,
            detect.time,
        );
        source.notify(&mut start);
        if !start.doit {
            info!(source = %source_id, "drag start vetoed");
            self.publisher.cancel(source_id);
        }
        Ok(())
    }

    /// DragEnter: fresh negotiation, the first candidate as default type.
    pub fn enter(&mut self, props: &PhaseProps) -> Result<(), SkipReason> {
        let pairing = self.pairing(props)?;
        let handed = EventState {
            operation: props.operation,
            feedback: props.feedback,
            data_type: pairing.valid_types.first().copied(),
        };
        let mut event = self.drop_event(DropTargetEventKind::DragEnter, props, &pairing, &handed);
        let invoked = pairing.target.notify(&mut event);
        let after = settled_state(&pairing, &event);

        // The client only knows what it reported, so the default type counts
        // as a change when it differs from that.
        let reported = EventState {
            data_type: props.data_type,
            ..handed
        };
        let delta = Delta::between(&reported, &after);
        debug!(
            source = %pairing.source_id,
            drop_target = %props.target,
            invoked,
            candidates = pairing.valid_types.len(),
            operation = %after.operation,
            "drag enter"
        );
        self.publish(&pairing, props, &delta, after.operation);
        Ok(())
    }

    /// DragOperationChanged and DragOver share one shape.
    pub fn track(&mut self, kind: PhaseKind, props: &PhaseProps) -> Result<(), SkipReason> {
        let event_kind = match kind {
            PhaseKind::OperationChanged => DropTargetEventKind::DragOperationChanged,
            _ => DropTargetEventKind::DragOver,
        };
        let pairing = self.pairing(props)?;
        let before = self.current_state(&pairing.source_id, props);
        let mut event = self.drop_event(event_kind, props, &pairing, &before);
        let invoked = pairing.target.notify(&mut event);
        let after = settled_state(&pairing, &event);

        let delta = Delta::between(&before, &after);
        debug!(
            source = %pairing.source_id,
            drop_target = %props.target,
            ?event_kind,
            invoked,
            changed = !delta.is_empty(),
            "drag tracked"
        );
        self.publish(&pairing, props, &delta, after.operation);
        Ok(())
    }

    /// DragLeave: raw client values only, no override consultation.
    pub fn leave(&mut self, props: &PhaseProps) -> Result<(), SkipReason> {
        let target = self.resolve_target(&props.target)?;
        let source = match &props.source {
            Some(source_id) => {
                if self.publisher.is_cancelled(source_id) {
                    return Err(SkipReason::Cancelled(source_id.clone()));
                }
                self.resolve_source(source_id).ok()
            }
            None => None,
        };

        let mut event = DropTargetEvent::new(
            DropTargetEventKind::DragLeave,
            props.target.clone(),
            props.point(),
            props.time,
        );
        event.detail = props.operation;
        event.operations =
            source.map_or(Operation::NONE, |source| allowed_operations(source, target));
        let invoked = target.notify(&mut event);

        if let Some(source_id) = &props.source {
            self.gestures.leave_target(&self.session, source_id, &props.target);
        }
        debug!(drop_target = %props.target, invoked, "drag leave");
        Ok(())
    }

    /// DropAccept, then DragSetData and Drop when the drop is possible.
    ///
    /// Returns the operation that survived the listeners.  The client does not
    /// report a leave for the drop target, so one is fired first.
    pub fn drop_accept(&mut self, props: &PhaseProps) -> Result<Operation, SkipReason> {
        let pairing = self.pairing(props)?;
        let state = self.current_state(&pairing.source_id, props);

        let mut leave = self.drop_event(DropTargetEventKind::DragLeave, props, &pairing, &state);
        leave.item = None;
        pairing.target.notify(&mut leave);

        let mut accept = self.drop_event(DropTargetEventKind::DropAccept, props, &pairing, &state);
        pairing.target.notify(&mut accept);
        let mut operation = check_operation(pairing.allowed, accept.detail);
        let data_type = check_data_type(accept.current_data_type, &pairing.valid_types);

        match data_type {
            Some(data_type) if !operation.is_none() => {
                let mut set_data = DragSourceEvent::new(
                    DragSourceEventKind::DragSetData,
                    pairing.source_id.clone(),
                    props.point(),
                    props.time,
                );
                set_data.data_type = Some(data_type);
                pairing.source.notify(&mut set_data);
                let data = transfer_data(pairing.target, &data_type, &set_data);

                let mut drop = self.drop_event(DropTargetEventKind::Drop, props, &pairing, &state);
                drop.detail = operation;
                drop.feedback = Feedback::NONE;
                drop.current_data_type = Some(data_type);
                drop.data = data;
                pairing.target.notify(&mut drop);
                operation = check_operation(pairing.allowed, drop.detail);
                info!(
                    source = %pairing.source_id,
                    drop_target = %props.target,
                    %operation,
                    type_id = data_type.type_id,
                    "drop performed"
                );
            }
            _ => {
                info!(
                    source = %pairing.source_id,
                    drop_target = %props.target,
                    %operation,
                    has_type = data_type.is_some(),
                    "drop not possible"
                );
            }
        }

        self.gestures
            .leave_target(&self.session, &pairing.source_id, &props.target);
        Ok(operation)
    }

    /// Builds drop-accept properties from the live gesture of the finished source.
    ///
    /// Returns `None` when the gesture has no current target.
    pub fn synthesized_drop_props(&self, finished: &PhaseProps) -> Option<PhaseProps> {
        let source_id = &finished.target;
        let gesture = self.gestures.get(&self.session, source_id)?;
        let target_id = gesture.target.clone()?;

        let mut props = finished.clone();
        props.target = target_id;
        props.source = Some(source_id.clone());
        if props.operation.is_none() {
            props.operation = gesture.last_operation;
        }
        let has_type_override = self
            .publisher
            .pending(source_id)
            .and_then(OverrideRecord::data_type)
            .is_some();
        if props.data_type.is_none() && !has_type_override && self.config.data_type_fallback {
            if let (Ok(source), Ok(target)) =
                (self.resolve_source(source_id), self.resolve_target(&props.target))
            {
                props.data_type = determine_data_types(source.transfers(), target.transfers())
                    .first()
                    .copied();
            }
        }
        debug!(source = %source_id, drop_target = %props.target, "synthesizing drop accept");
        Some(props)
    }

    /// DragFinished: clears the source's overrides and fires drag end.
    ///
    /// Clearing happens even when the source widget is gone.
    pub fn finished(&mut self, props: &PhaseProps, operation: Operation) -> Result<(), SkipReason> {
        let source_id = &props.target;
        self.publisher.reset(source_id);
        self.gestures.end(&self.session, source_id);

        let source = self.resolve_source(source_id)?;
        let mut event = DragSourceEvent::new(
            DragSourceEventKind::DragFinished,
            source_id.clone(),
            props.point(),
            props.time,
        );
        event.detail = operation;
        event.doit = true;
        source.notify(&mut event);
        info!(source = %source_id, %operation, "drag finished");
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn resolve_source(&self, id: &WidgetId) -> Result<&'a DragSource, SkipReason> {
        let widgets = self.widgets;
        let widget = widgets
            .resolve(id)
            .ok_or_else(|| SkipReason::MissingWidget(id.clone()))?;
        widget
            .drag_source()
            .ok_or_else(|| SkipReason::NotADragSource(id.clone()))
    }

    fn resolve_target(&self, id: &WidgetId) -> Result<&'a DropTarget, SkipReason> {
        let widgets = self.widgets;
        let widget = widgets
            .resolve(id)
            .ok_or_else(|| SkipReason::MissingWidget(id.clone()))?;
        widget
            .drop_target()
            .ok_or_else(|| SkipReason::NotADropTarget(id.clone()))
    }

    fn pairing(&self, props: &PhaseProps) -> Result<Pairing<'a>, SkipReason> {
        let source_id = props.source.as_ref().ok_or(SkipReason::MissingSource)?;
        if self.publisher.is_cancelled(source_id) {
            return Err(SkipReason::Cancelled(source_id.clone()));
        }
        let target = self.resolve_target(&props.target)?;
        let source = self.resolve_source(source_id)?;
        Ok(Pairing {
            source_id: source_id.clone(),
            source,
            target,
            allowed: allowed_operations(source, target),
            valid_types: determine_data_types(source.transfers(), target.transfers()),
        })
    }

    /// Override-or-reported values of the three reconciled fields.
    fn current_state(&self, source_id: &WidgetId, props: &PhaseProps) -> EventState {
        let pending = self.publisher.pending(source_id);
        EventState {
            operation: pending
                .and_then(OverrideRecord::operation)
                .unwrap_or(props.operation),
            feedback: pending
                .and_then(OverrideRecord::feedback)
                .unwrap_or(props.feedback),
            data_type: pending
                .and_then(OverrideRecord::data_type)
                .or(props.data_type),
        }
    }

    fn drop_event(
        &self,
        kind: DropTargetEventKind,
        props: &PhaseProps,
        pairing: &Pairing<'_>,
        state: &EventState,
    ) -> DropTargetEvent {
        let mut event = DropTargetEvent::new(kind, props.target.clone(), props.point(), props.time);
        event.detail = state.operation;
        event.operations = pairing.allowed;
        event.feedback = state.feedback;
        event.current_data_type = state.data_type;
        event.data_types = pairing.valid_types.clone();
        event.item = props
            .item
            .as_ref()
            .filter(|item| self.widgets.resolve(item).is_some())
            .cloned();
        event
    }

    fn publish(
        &mut self,
        pairing: &Pairing<'_>,
        props: &PhaseProps,
        delta: &Delta,
        operation: Operation,
    ) {
        self.publisher.publish(
            &pairing.source_id,
            &props.target,
            pairing.allowed,
            delta,
            &pairing.valid_types,
        );
        self.gestures.touch(
            &self.session,
            &pairing.source_id,
            &props.target,
            pairing.allowed,
            operation,
        );
    }
}

/// The three fields as the listeners left them, with the operation coerced
/// into the allowed mask.
fn settled_state(pairing: &Pairing<'_>, event: &DropTargetEvent) -> EventState {
    EventState {
        operation: check_operation(pairing.allowed, event.detail),
        feedback: event.feedback,
        data_type: event.current_data_type,
    }
}

/// Converts the payload set by the drag source through the drop target's
/// transfer for `data_type`.
fn transfer_data(
    target: &DropTarget,
    data_type: &TransferData,
    set_data: &DragSourceEvent,
) -> Option<TransferPayload> {
    if !set_data.doit {
        debug!(source = %set_data.source, "drag set data refused");
        return None;
    }
    let Some(transfer) = find_transfer_by_type(target.transfers(), data_type) else {
        warn!(type_id = data_type.type_id, "no drop target transfer accepts the type");
        return None;
    };
    let Some(payload) = set_data.data.as_ref() else {
        warn!(source = %set_data.source, "drag source provided no data");
        return None;
    };
    let converted = transfer.convert(payload, data_type);
    if converted.is_none() {
        warn!(
            transfer = %transfer.name(),
            type_id = data_type.type_id,
            "transfer rejected payload"
        );
    }
    converted
}
