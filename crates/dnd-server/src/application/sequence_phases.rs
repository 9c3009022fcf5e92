//! Processing order of the drag phases in one batch.
//!
//! The client reports at most one notification per phase but does not say in
//! which order they happened.  The order is reconstructed from fixed rules:
//!
//! ```text
//! Start
//! ├─ leave.time <= enter.time:  Leave → Enter → OperationChanged → Over
//! └─ otherwise:                 Enter → OperationChanged → Over → Leave
//! DropAccept
//! Finished
//! ```
//!
//! A leave that is not later than the enter belongs to the *previous* target:
//! the pointer left it and then entered the new one within the same round trip.

use dnd_core::protocol::notify::{NotifyBatch, PhaseKind};

const ENTER_FIRST: [PhaseKind; 4] = [
    PhaseKind::Enter,
    PhaseKind::OperationChanged,
    PhaseKind::Over,
    PhaseKind::Leave,
];

const LEAVE_FIRST: [PhaseKind; 4] = [
    PhaseKind::Leave,
    PhaseKind::Enter,
    PhaseKind::OperationChanged,
    PhaseKind::Over,
];

/// Returns `true` when both Enter and Leave are present and the leave
/// happened no later than the enter.
pub fn is_leave_before_enter(batch: &NotifyBatch) -> bool {
    match (batch.props(PhaseKind::Enter), batch.props(PhaseKind::Leave)) {
        (Some(enter), Some(leave)) => leave.time <= enter.time,
        _ => false,
    }
}

/// Returns the phases present in `batch`, in processing order.
pub fn sequence_phases(batch: &NotifyBatch) -> Vec<PhaseKind> {
    let middle = if is_leave_before_enter(batch) {
        LEAVE_FIRST
    } else {
        ENTER_FIRST
    };
    std::iter::once(PhaseKind::Start)
        .chain(middle)
        .chain([PhaseKind::DropAccept, PhaseKind::Finished])
        .filter(|kind| batch.contains(*kind))
        .collect()
}
