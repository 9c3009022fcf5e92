//! Replays a recorded sequence of client requests through one session.
//!
//! A recording is a JSON array of client messages, each shaped like the
//! requests a browser client sends:
//!
//! ```json
//! [
//!   { "head": { "requestCounter": 1 },
//!     "operations": [["notify", "w2", "dragStart", { "x": 10, "y": 20, "time": 1 }]] }
//! ]
//! ```
//!
//! Each request yields one [`ReplayRecord`].

use dnd_core::protocol::message::{ClientMessage, ProtocolError};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::application::reconcile::RoundTripReport;
use crate::application::ui_session::UiSession;

/// Outcome of one replayed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub request_counter: Option<i64>,
    pub report: RoundTripReport,
}

/// Parses a recording.  `text` must be a JSON array of client messages.
pub fn parse_recording(text: &str) -> Result<Vec<ClientMessage>, ProtocolError> {
    let values: Vec<Value> = serde_json::from_str(text)?;
    values.into_iter().map(ClientMessage::from_value).collect()
}

/// Handles every message in order and collects one record per request.
pub fn replay(session: &mut UiSession, messages: &[ClientMessage]) -> Vec<ReplayRecord> {
    let records: Vec<ReplayRecord> = messages
        .iter()
        .map(|message| ReplayRecord {
            request_counter: message.request_counter(),
            report: session.handle_request(message),
        })
        .collect();
    info!(session = %session.id(), requests = records.len(), "replay finished");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnd_core::domain::config::EngineConfig;
    use dnd_core::domain::widget::WidgetTree;

    #[test]
    fn test_parse_recording_reads_every_message() {
        // Arrange
        let text = r#"[
            { "head": { "requestCounter": 1 }, "operations": [] },
            { "head": { "requestCounter": 2 },
              "operations": [["notify", "w2", "dragFinished", { "x": 1, "y": 2 }]] }
        ]"#;

        // Act
        let messages = parse_recording(text).expect("valid recording");

        // Assert
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].request_counter(), Some(2));
        assert_eq!(messages[1].notify_operations().count(), 1);
    }

    #[test]
    fn test_parse_recording_rejects_non_array() {
        assert!(matches!(
            parse_recording(r#"{ "head": {} }"#),
            Err(ProtocolError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_replay_yields_one_record_per_request() {
        let mut session = UiSession::new(WidgetTree::new(), EngineConfig::default());
        let messages = vec![
            ClientMessage::new(vec![]).with_request_counter(1),
            ClientMessage::new(vec![]).with_request_counter(2),
        ];

        let records = replay(&mut session, &messages);

        let counters: Vec<_> = records.iter().map(|r| r.request_counter).collect();
        assert_eq!(counters, vec![Some(1), Some(2)]);
    }
}
