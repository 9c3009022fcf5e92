//! ChangePublisher: turns listener changes into override records.
//!
//! After a drop-target listener ran, the reconciler computes a [`Delta`]
//! between what the listeners were handed and what they left behind.  Every
//! changed field becomes an override on the drag source's record, so the
//! next response can tell the client, and so later phases read the
//! listener's value instead of the client's stale one.
//!
//! Values are normalised before they are stored:
//!
//! - the operation is coerced into the allowed mask with [`check_operation`];
//! - the data type must be one of the negotiated candidates.  An unknown type
//!   is replaced by the first candidate when fallback is enabled, otherwise
//!   the data-type override is cleared.

use dnd_core::domain::config::EngineConfig;
use dnd_core::domain::operation::{check_operation, Feedback, Operation};
use dnd_core::domain::overrides::{Delta, OverrideRecord, OverrideStore};
use dnd_core::domain::session::SessionId;
use dnd_core::domain::transfer::{check_data_type, TransferData};
use dnd_core::domain::widget::WidgetId;
use tracing::debug;

/// Publishes override changes for one session.
pub struct ChangePublisher<'a> {
    store: &'a mut OverrideStore,
    session: SessionId,
    config: EngineConfig,
}

impl<'a> ChangePublisher<'a> {
    pub fn new(store: &'a mut OverrideStore, session: SessionId, config: EngineConfig) -> Self {
        Self {
            store,
            session,
            config,
        }
    }

    /// The pending overrides of `source`, if any.
    pub fn pending(&self, source: &WidgetId) -> Option<&OverrideRecord> {
        self.store.record(&self.session, source)
    }

    pub fn is_cancelled(&self, source: &WidgetId) -> bool {
        self.store.is_cancelled(&self.session, source)
    }

    /// Publishes every field set in `delta`.
    ///
    /// `control` is the drop-target control the change came from, `allowed`
    /// the allowed-operations mask and `valid_types` the negotiated candidates.
    pub fn publish(
        &mut self,
        source: &WidgetId,
        control: &WidgetId,
        allowed: Operation,
        delta: &Delta,
        valid_types: &[TransferData],
    ) {
        if let Some(operation) = delta.operation {
            self.change_operation(source, control, allowed, operation);
        }
        if let Some(data_type) = delta.data_type {
            self.change_data_type(source, control, data_type, valid_types);
        }
        if let Some(feedback) = delta.feedback {
            self.change_feedback(source, control, feedback);
        }
    }

    pub fn change_operation(
        &mut self,
        source: &WidgetId,
        control: &WidgetId,
        allowed: Operation,
        requested: Operation,
    ) {
        let checked = check_operation(allowed, requested);
        debug!(%source, %control, %requested, %checked, "publishing operation override");
        self.store.set_operation(&self.session, source, control, checked);
    }

    pub fn change_data_type(
        &mut self,
        source: &WidgetId,
        control: &WidgetId,
        requested: Option<TransferData>,
        valid_types: &[TransferData],
    ) {
        let mut checked = check_data_type(requested, valid_types);
        if checked.is_none() && self.config.data_type_fallback {
            checked = valid_types.first().copied();
        }
        match checked {
            Some(data_type) => {
                debug!(
                    %source,
                    %control,
                    type_id = data_type.type_id,
                    "publishing data type override"
                );
                self.store.set_data_type(&self.session, source, control, data_type);
            }
            None => {
                debug!(%source, %control, "no valid data type, clearing override");
                self.store.cancel_data_type(&self.session, source);
            }
        }
    }

    pub fn change_feedback(&mut self, source: &WidgetId, control: &WidgetId, feedback: Feedback) {
        debug!(%source, %control, feedback = feedback.bits(), "publishing feedback override");
        self.store.set_feedback(&self.session, source, control, feedback);
    }

    /// Clears every override and the cancel flag of `source`.
    pub fn reset(&mut self, source: &WidgetId) {
        self.store.clear(&self.session, source);
    }

    /// Marks the gesture of `source` as refused.
    pub fn cancel(&mut self, source: &WidgetId) {
        debug!(%source, "drag cancelled");
        self.store.cancel_drag(&self.session, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnd_core::domain::transfer::{FILE_TYPE, TEXT_TYPE};

    fn ids() -> (WidgetId, WidgetId) {
        (WidgetId::from("w2"), WidgetId::from("w7"))
    }

    #[test]
    fn test_operation_outside_allowed_mask_is_published_as_none() {
        // Arrange
        let (source, target) = ids();
        let mut store = OverrideStore::new();
        let session = SessionId::new();
        let mut publisher = ChangePublisher::new(&mut store, session, EngineConfig::default());

        // Act
        publisher.change_operation(&source, &target, Operation::COPY, Operation::MOVE);

        // Assert
        assert_eq!(
            publisher.pending(&source).and_then(OverrideRecord::operation),
            Some(Operation::NONE)
        );
    }

    #[test]
    fn test_invalid_data_type_falls_back_to_first_candidate() {
        let (source, target) = ids();
        let mut store = OverrideStore::new();
        let mut publisher =
            ChangePublisher::new(&mut store, SessionId::new(), EngineConfig::default());
        let valid = [TransferData::new(FILE_TYPE), TransferData::new(TEXT_TYPE)];

        publisher.change_data_type(&source, &target, Some(TransferData::new(99)), &valid);

        assert_eq!(
            publisher.pending(&source).and_then(OverrideRecord::data_type),
            Some(TransferData::new(FILE_TYPE))
        );
    }

    #[test]
    fn test_invalid_data_type_without_fallback_clears_override() {
        let (source, target) = ids();
        let mut store = OverrideStore::new();
        let config = EngineConfig {
            data_type_fallback: false,
            ..EngineConfig::default()
        };
        let mut publisher = ChangePublisher::new(&mut store, SessionId::new(), config);
        let valid = [TransferData::new(TEXT_TYPE)];
        publisher.change_data_type(&source, &target, Some(TransferData::new(TEXT_TYPE)), &valid);

        publisher.change_data_type(&source, &target, Some(TransferData::new(99)), &valid);

        assert_eq!(publisher.pending(&source).and_then(OverrideRecord::data_type), None);
    }

    #[test]
    fn test_empty_candidate_set_never_publishes_a_type() {
        let (source, target) = ids();
        let mut store = OverrideStore::new();
        let mut publisher =
            ChangePublisher::new(&mut store, SessionId::new(), EngineConfig::default());

        publisher.change_data_type(&source, &target, Some(TransferData::new(TEXT_TYPE)), &[]);

        assert!(publisher.pending(&source).is_none());
    }

    #[test]
    fn test_publish_only_touches_changed_fields() {
        let (source, target) = ids();
        let mut store = OverrideStore::new();
        let mut publisher =
            ChangePublisher::new(&mut store, SessionId::new(), EngineConfig::default());
        let delta = Delta {
            feedback: Some(Feedback::SELECT),
            ..Delta::default()
        };

        publisher.publish(&source, &target, Operation::ALL, &delta, &[]);

        let record = publisher.pending(&source).expect("record");
        assert_eq!(record.feedback(), Some(Feedback::SELECT));
        assert_eq!(record.operation(), None);
        assert_eq!(record.data_type(), None);
    }

    #[test]
    fn test_reset_clears_cancel_flag() {
        let (source, _) = ids();
        let mut store = OverrideStore::new();
        let mut publisher =
            ChangePublisher::new(&mut store, SessionId::new(), EngineConfig::default());
        publisher.cancel(&source);
        assert!(publisher.is_cancelled(&source));

        publisher.reset(&source);

        assert!(!publisher.is_cancelled(&source));
    }
}
