//! Decoding of the JSON message a client sends with every request.
//!
//! # Message shape
//!
//! ```json
//! { "head": { "requestCounter": 21 },
//!   "operations": [
//!     [ "set",    "w3", { "selection": [ 1, 2 ] } ],
//!     [ "notify", "w3", "dragOver", { "x": 10, "y": 20, "time": 5 } ],
//!     [ "call",   "w3", "open", { } ] ] }
//! ```
//!
//! Every operation is a JSON array whose first element names the action.
//! Only `notify` operations matter for drag and drop, but the other two are
//! decoded as well so a malformed message is rejected as a whole.
//!
//! # Property values
//!
//! Notify properties are read as strings: strings verbatim, numbers and
//! booleans in their textual form, `null` as the literal `"null"`.  Typed
//! interpretation (integers, operations, data types) happens one level up in
//! [`crate::protocol::notify`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::widget::WidgetId;

/// Errors raised while decoding a client message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The top-level value is not a JSON object.
    #[error("client message must be a JSON object")]
    NotAnObject,

    /// The `operations` array is absent or not an array.
    #[error("client message has no operations array")]
    MissingOperations,

    /// The action name of an operation is not `set`, `notify` or `call`.
    #[error("operation {index}: unknown action {action:?}")]
    UnknownAction { index: usize, action: String },

    /// An operation has the wrong number or type of elements.
    #[error("operation {index}: {reason}")]
    MalformedOperation { index: usize, reason: String },
}

/// One decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMessage {
    head: Map<String, Value>,
    operations: Vec<ClientOperation>,
}

/// One entry of the `operations` array.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientOperation {
    /// Property values the client changed.
    Set {
        target: WidgetId,
        properties: Map<String, Value>,
    },
    /// An event the client reports.
    Notify(NotifyOperation),
    /// A remote method invocation.
    Call {
        target: WidgetId,
        method: String,
        properties: Map<String, Value>,
    },
}

/// An event notification for one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyOperation {
    target: WidgetId,
    event: String,
    properties: Map<String, Value>,
}

impl NotifyOperation {
    pub fn new(target: impl Into<WidgetId>, event: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            event: event.into(),
            properties: Map::new(),
        }
    }

    /// Adds a property.  Used by tests and the replay tool to build messages.
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn target(&self) -> &WidgetId {
        &self.target
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Reads a property as a string, or `None` when absent.
    pub fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).map(value_to_string)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

impl ClientMessage {
    /// Builds a message from already decoded operations.
    pub fn new(operations: Vec<ClientOperation>) -> Self {
        Self {
            head: Map::new(),
            operations,
        }
    }

    /// Sets the request counter in the message head.
    pub fn with_request_counter(mut self, counter: i64) -> Self {
        self.head.insert("requestCounter".to_string(), Value::from(counter));
        self
    }

    /// Decodes a message from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidJson`] for unparseable text and the
    /// structural variants of [`ProtocolError`] for a wrongly shaped message.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Decodes a message from a parsed JSON value.
    ///
    /// # Errors
    ///
    /// See [`ClientMessage::from_json`].
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut root) = value else {
            return Err(ProtocolError::NotAnObject);
        };
        let head = match root.remove("head") {
            Some(Value::Object(head)) => head,
            _ => Map::new(),
        };
        let Some(Value::Array(raw)) = root.remove("operations") else {
            return Err(ProtocolError::MissingOperations);
        };
        let operations = raw
            .into_iter()
            .enumerate()
            .map(|(index, op)| decode_operation(index, op))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { head, operations })
    }

    pub fn head(&self) -> &Map<String, Value> {
        &self.head
    }

    /// The `requestCounter` of the message head, if present and numeric.
    pub fn request_counter(&self) -> Option<i64> {
        self.head.get("requestCounter").and_then(Value::as_i64)
    }

    pub fn operations(&self) -> &[ClientOperation] {
        &self.operations
    }

    /// All notify operations, in message order.
    pub fn notify_operations(&self) -> impl Iterator<Item = &NotifyOperation> {
        self.operations.iter().filter_map(|op| match op {
            ClientOperation::Notify(notify) => Some(notify),
            _ => None,
        })
    }

    /// The last notify operation for `event`, optionally restricted to one target.
    ///
    /// With `target == None` any widget matches.
    pub fn last_notify_operation_for(
        &self,
        target: Option<&WidgetId>,
        event: &str,
    ) -> Option<&NotifyOperation> {
        self.notify_operations()
            .filter(|notify| notify.event == event)
            .filter(|notify| target.map_or(true, |t| &notify.target == t))
            .last()
    }
}

// ── Decoding helpers ──────────────────────────────────────────────────────────

fn decode_operation(index: usize, value: Value) -> Result<ClientOperation, ProtocolError> {
    let malformed = |reason: &str| ProtocolError::MalformedOperation {
        index,
        reason: reason.to_string(),
    };
    let Value::Array(parts) = value else {
        return Err(malformed("operation must be an array"));
    };
    let mut parts = parts.into_iter();
    let action = match parts.next() {
        Some(Value::String(action)) => action,
        _ => return Err(malformed("missing action name")),
    };
    let target = match parts.next() {
        Some(Value::String(target)) => WidgetId::new(target),
        _ => return Err(malformed("missing target id")),
    };
    let operation = match action.as_str() {
        "set" => ClientOperation::Set {
            target,
            properties: properties(parts.next())
                .ok_or_else(|| malformed("set needs a property object"))?,
        },
        "notify" => {
            let event = match parts.next() {
                Some(Value::String(event)) => event,
                _ => return Err(malformed("notify needs an event name")),
            };
            ClientOperation::Notify(NotifyOperation {
                target,
                event,
                properties: properties(parts.next())
                    .ok_or_else(|| malformed("notify needs a property object"))?,
            })
        }
        "call" => {
            let method = match parts.next() {
                Some(Value::String(method)) => method,
                _ => return Err(malformed("call needs a method name")),
            };
            ClientOperation::Call {
                target,
                method,
                properties: properties(parts.next())
                    .ok_or_else(|| malformed("call needs a property object"))?,
            }
        }
        _ => {
            return Err(ProtocolError::UnknownAction {
                index,
                action: action.clone(),
            })
        }
    };
    if parts.next().is_some() {
        return Err(malformed("too many elements"));
    }
    Ok(operation)
}

/// An absent property object is treated as empty.
fn properties(value: Option<Value>) -> Option<Map<String, Value>> {
    match value {
        None | Some(Value::Null) => Some(Map::new()),
        Some(Value::Object(map)) => Some(map),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> &'static str {
        r#"{
            "head": { "requestCounter": 21 },
            "operations": [
                [ "set", "w3", { "p1": "foo" } ],
                [ "notify", "w3", "dragOver", { "x": 10, "y": 20, "time": 5, "dataType": null } ],
                [ "notify", "w4", "dragOver", { "x": 11 } ],
                [ "call", "w3", "open", { } ]
            ]
        }"#
    }

    #[test]
    fn test_from_json_decodes_every_operation() {
        // Act
        let message = ClientMessage::from_json(sample()).expect("decode");

        // Assert
        assert_eq!(message.request_counter(), Some(21));
        assert_eq!(message.operations().len(), 4);
        assert!(matches!(message.operations()[0], ClientOperation::Set { .. }));
        assert!(matches!(
            &message.operations()[3],
            ClientOperation::Call { method, .. } if method == "open"
        ));
    }

    #[test]
    fn test_property_values_are_read_as_strings() {
        let message = ClientMessage::from_json(sample()).unwrap();
        let notify = message
            .last_notify_operation_for(Some(&WidgetId::from("w3")), "dragOver")
            .expect("notify");

        assert_eq!(notify.property("x").as_deref(), Some("10"));
        assert_eq!(notify.property("dataType").as_deref(), Some("null"));
        assert_eq!(notify.property("missing"), None);
    }

    #[test]
    fn test_last_notify_operation_without_target_returns_last_match() {
        let message = ClientMessage::from_json(sample()).unwrap();

        let notify = message.last_notify_operation_for(None, "dragOver").unwrap();

        assert_eq!(notify.target(), &WidgetId::from("w4"));
        assert!(message.last_notify_operation_for(None, "dragEnter").is_none());
    }

    #[test]
    fn test_missing_head_has_no_request_counter() {
        let message = ClientMessage::from_value(json!({ "operations": [] })).unwrap();
        assert_eq!(message.request_counter(), None);
    }

    #[test]
    fn test_non_object_message_is_rejected() {
        let result = ClientMessage::from_value(json!([1, 2]));
        assert!(matches!(result, Err(ProtocolError::NotAnObject)));
    }

    #[test]
    fn test_missing_operations_is_rejected() {
        let result = ClientMessage::from_value(json!({ "head": {} }));
        assert!(matches!(result, Err(ProtocolError::MissingOperations)));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = ClientMessage::from_value(json!({ "operations": [ [ "destroy", "w3" ] ] }));
        assert!(matches!(
            result,
            Err(ProtocolError::UnknownAction { index: 0, ref action }) if action == "destroy"
        ));
    }

    #[test]
    fn test_notify_without_event_name_is_malformed() {
        let result = ClientMessage::from_value(json!({ "operations": [ [ "notify", "w3" ] ] }));
        assert!(matches!(result, Err(ProtocolError::MalformedOperation { index: 0, .. })));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            ClientMessage::from_json("{ not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_builder_produces_same_lookup_as_decoder() {
        let notify = NotifyOperation::new("w3", "dragStart").with_property("x", 4);
        let message =
            ClientMessage::new(vec![ClientOperation::Notify(notify)]).with_request_counter(3);

        assert_eq!(message.request_counter(), Some(3));
        let found = message.last_notify_operation_for(None, "dragStart").unwrap();
        assert_eq!(found.property("x").as_deref(), Some("4"));
    }
}
