//! UiSession: one client session and its request loop.
//!
//! A session owns its widget tree, its drag state and a deferred-action
//! queue.  For every client request:
//!
//! ```text
//! handle_request(message)
//!  ├─ queue drag reconciliation (if the message carries drag notifications)
//!  ├─ count the set and call operations (external collaborators apply them)
//!  └─ drain the deferred queue, oldest first
//! ```
//!
//! Everything runs on the caller's thread.  `UiSession` is `Send`, so
//! consecutive requests may be handled on different threads, but a session
//! is never touched by two threads at once.

use dnd_core::domain::config::EngineConfig;
use dnd_core::domain::session::SessionId;
use dnd_core::domain::widget::WidgetTree;
use dnd_core::protocol::message::{ClientMessage, ClientOperation};
use dnd_core::protocol::notify::NotifyBatch;
use tracing::{debug, info};

use crate::application::deferred_actions::ProcessActionRunner;
use crate::application::process_events::{DndEngine, SessionSnapshot};
use crate::application::reconcile::RoundTripReport;

/// State the deferred actions of a session operate on.
#[derive(Debug)]
pub struct SessionState {
    pub id: SessionId,
    pub widgets: WidgetTree,
    pub engine: DndEngine,
    /// `requestCounter` of the request being handled.
    pub request_counter: Option<i64>,
    last_report: Option<RoundTripReport>,
}

/// One client session.
#[derive(Debug)]
pub struct UiSession {
    state: SessionState,
    runner: ProcessActionRunner<SessionState>,
}

impl UiSession {
    pub fn new(widgets: WidgetTree, config: EngineConfig) -> Self {
        Self::with_id(SessionId::new(), widgets, config)
    }

    pub fn with_id(id: SessionId, widgets: WidgetTree, config: EngineConfig) -> Self {
        info!(session = %id, "session started");
        Self {
            state: SessionState {
                id,
                widgets,
                engine: DndEngine::new(config),
                request_counter: None,
                last_report: None,
            },
            runner: ProcessActionRunner::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.state.id
    }

    pub fn widgets(&self) -> &WidgetTree {
        &self.state.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetTree {
        &mut self.state.widgets
    }

    pub fn engine(&self) -> &DndEngine {
        &self.state.engine
    }

    /// Queues `action` to run at the end of the current (or next) request.
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce(&mut SessionState) + Send + 'static,
    {
        self.runner.add(action);
    }

    /// Handles one client request and returns the drag reconciliation report.
    ///
    /// A request without drag notifications yields an empty report.
    pub fn handle_request(&mut self, message: &ClientMessage) -> RoundTripReport {
        self.state.request_counter = message.request_counter();

        let batch = NotifyBatch::from_message(message);
        if !batch.is_empty() {
            self.runner.add(move |state: &mut SessionState| {
                let report = state.engine.process_batch(&state.id, &state.widgets, &batch);
                state.last_report = Some(report);
            });
        }

        let (sets, calls) = message
            .operations()
            .iter()
            .fold((0, 0), |(sets, calls), op| match op {
                ClientOperation::Set { .. } => (sets + 1, calls),
                ClientOperation::Call { .. } => (sets, calls + 1),
                ClientOperation::Notify(_) => (sets, calls),
            });
        debug!(
            session = %self.state.id,
            request = ?self.state.request_counter,
            sets,
            calls,
            queued = self.runner.len(),
            "handling request"
        );

        self.runner.execute(&mut self.state);
        self.state.last_report.take().unwrap_or_default()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.engine.export_session(&self.state.id)
    }

    /// Restores drag state saved from a session with the same id.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.state.engine.import_session(snapshot);
    }

    /// Ends the session and drops its drag state.
    pub fn close(mut self) {
        let id = self.state.id;
        self.state.engine.end_session(&id);
        info!(session = %id, "session closed");
    }
}
