//! Integration tests for operation coercion and data-type negotiation.
//!
//! These tests check the negotiation helpers through the public API over
//! every operation mask and a mix of built-in and custom transfers.

use std::sync::Arc;

use dnd_core::domain::operation::{check_operation, Operation};
use dnd_core::domain::transfer::{
    check_data_type, determine_data_types, ByteArrayTransfer, FileTransfer, HtmlTransfer,
    TextTransfer, Transfer, TransferData, UrlTransfer, FILE_TYPE, HTML_TYPE, TEXT_TYPE, URL_TYPE,
};
use dnd_core::protocol::message::ClientMessage;
use dnd_core::protocol::notify::{NotifyBatch, PhaseKind};

fn all_masks() -> impl Iterator<Item = Operation> {
    (0..8).map(Operation::from_bits)
}

fn custom(name: &str, type_id: i32) -> Arc<dyn Transfer> {
    Arc::new(ByteArrayTransfer::new(name, type_id).expect("non-reserved id"))
}

// ── check_operation ───────────────────────────────────────────────────────────

#[test]
fn test_check_operation_never_leaves_allowed_mask() {
    for allowed in all_masks() {
        for requested in all_masks() {
            let checked = check_operation(allowed, requested);
            assert!(
                allowed.contains(checked),
                "{checked} escaped allowed mask {allowed} for request {requested}"
            );
        }
    }
}

#[test]
fn test_check_operation_is_none_for_disjoint_masks() {
    for allowed in all_masks() {
        for requested in all_masks() {
            if !allowed.intersects(requested) {
                assert_eq!(check_operation(allowed, requested), Operation::NONE);
            }
        }
    }
}

#[test]
fn test_check_operation_keeps_single_allowed_operation() {
    for op in [Operation::COPY, Operation::MOVE, Operation::LINK] {
        assert_eq!(check_operation(Operation::ALL, op), op);
    }
}

// ── Negotiation ───────────────────────────────────────────────────────────────

#[test]
fn test_determine_data_types_is_repeatable() {
    // Arrange
    let source: Vec<Arc<dyn Transfer>> = vec![
        Arc::new(HtmlTransfer),
        Arc::new(TextTransfer),
        custom("rows", 77),
    ];
    let target: Vec<Arc<dyn Transfer>> =
        vec![Arc::new(TextTransfer), custom("rows", 77), Arc::new(HtmlTransfer)];

    // Act
    let first = determine_data_types(&source, &target);
    let second = determine_data_types(&source, &target);

    // Assert
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            TransferData::new(HTML_TYPE),
            TransferData::new(TEXT_TYPE),
            TransferData::new(77),
        ]
    );
}

#[test]
fn test_determine_data_types_is_empty_without_common_transfer() {
    let source: Vec<Arc<dyn Transfer>> = vec![Arc::new(FileTransfer)];
    let target: Vec<Arc<dyn Transfer>> = vec![Arc::new(TextTransfer), Arc::new(UrlTransfer)];

    assert!(determine_data_types(&source, &target).is_empty());
}

#[test]
fn test_check_data_type_matches_only_negotiated_types() {
    let valid = vec![TransferData::new(TEXT_TYPE), TransferData::new(URL_TYPE)];

    for type_id in [TEXT_TYPE, HTML_TYPE, URL_TYPE, FILE_TYPE, 77] {
        let candidate = TransferData::new(type_id);
        let expected = valid.contains(&candidate).then_some(candidate);
        assert_eq!(check_data_type(Some(candidate), &valid), expected);
        assert_eq!(check_data_type(Some(candidate), &[]), None);
    }
    assert_eq!(check_data_type(None, &valid), None);
}

// ── Notify batches ────────────────────────────────────────────────────────────

#[test]
fn test_batch_keeps_last_notification_per_phase() {
    // Arrange
    let message = ClientMessage::from_json(
        r#"{
            "head": { "requestCounter": 3 },
            "operations": [
                ["notify", "w7", "dragOver",
                 { "source": "w2", "x": 1, "time": 10, "operation": "copy" }],
                ["set", "w3", { "text": "ignored" }],
                ["notify", "w7", "dragOver",
                 { "source": "w2", "x": 2, "time": 11, "operation": "link" }],
                ["notify", "w2", "dragFinished", { "x": 2, "y": 3 }]
            ]
        }"#,
    )
    .expect("valid message");

    // Act
    let batch = NotifyBatch::from_message(&message);

    // Assert
    assert_eq!(batch.len(), 2);
    let over = batch.props(PhaseKind::Over).expect("over present");
    assert_eq!(over.x, 2);
    assert_eq!(over.time, 11);
    assert_eq!(over.operation, Operation::LINK);
    assert!(batch.contains(PhaseKind::Finished));
    assert!(!batch.contains(PhaseKind::DropAccept));
}

#[test]
fn test_malformed_numbers_fall_back_to_defaults() {
    let message = ClientMessage::from_json(
        r#"{ "operations": [
            ["notify", "w7", "dragEnter", { "source": "w2", "x": "left", "y": 12.6,
                                             "feedback": "lots", "operation": "teleport",
                                             "dataType": "text" }]
        ] }"#,
    )
    .expect("valid message");

    let batch = NotifyBatch::from_message(&message);
    let enter = batch.props(PhaseKind::Enter).expect("enter present");

    assert_eq!(enter.x, 0);
    assert_eq!(enter.y, 13);
    assert_eq!(enter.operation, Operation::NONE);
    assert_eq!(enter.data_type, Some(TransferData::new(0)));
}
