//! Drop operations and drop-feedback bitmasks.
//!
//! # Operations and masks (for beginners)
//!
//! A drag can end in one of three ways: the data is **copied**, **moved**, or
//! **linked** to the drop target.  Each of these is one bit:
//!
//! ```text
//! NONE = 0b000   COPY = 0b001   MOVE = 0b010   LINK = 0b100
//! ```
//!
//! The same type is used for two things:
//!
//! - a single *requested* operation (one bit, or `NONE`), and
//! - an operation *mask* listing every operation a drag source or drop target
//!   allows (several bits).
//!
//! The operations allowed for a drag session are the intersection of the
//! source's and the target's masks.  [`check_operation`] coerces a requested
//! operation into that intersection.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use serde::{Deserialize, Serialize};

/// A drop operation or a mask of drop operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Operation(u32);

impl Operation {
    /// No operation; the drop is not possible.
    pub const NONE: Operation = Operation(0);
    pub const COPY: Operation = Operation(1 << 0);
    pub const MOVE: Operation = Operation(1 << 1);
    pub const LINK: Operation = Operation(1 << 2);
    /// Every operation the client can report.
    pub const ALL: Operation = Operation(0b111);

    /// Builds an operation from raw bits, dropping bits the protocol does not know.
    pub const fn from_bits(bits: u32) -> Self {
        Operation(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Operation) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Operation) -> bool {
        self.0 & other.0 != 0
    }

    /// Parses the `operation` notify property.
    ///
    /// Only `"copy"`, `"move"` and `"link"` are recognised; anything else,
    /// including an absent property, maps to [`Operation::NONE`].
    pub fn from_client_value(value: Option<&str>) -> Self {
        match value {
            Some("copy") => Operation::COPY,
            Some("move") => Operation::MOVE,
            Some("link") => Operation::LINK,
            _ => Operation::NONE,
        }
    }

    /// Returns the protocol name of a single-bit operation.
    pub fn client_value(self) -> Option<&'static str> {
        match self {
            Operation::COPY => Some("copy"),
            Operation::MOVE => Some("move"),
            Operation::LINK => Some("link"),
            _ => None,
        }
    }
}

impl BitAnd for Operation {
    type Output = Operation;

    fn bitand(self, rhs: Operation) -> Operation {
        Operation(self.0 & rhs.0)
    }
}

impl BitOr for Operation {
    type Output = Operation;

    fn bitor(self, rhs: Operation) -> Operation {
        Operation(self.0 | rhs.0)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        let names: Vec<&str> = [Operation::COPY, Operation::MOVE, Operation::LINK]
            .into_iter()
            .filter(|op| self.contains(*op))
            .filter_map(Operation::client_value)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// Coerces `requested` into the `allowed` mask.
///
/// Returns [`Operation::NONE`] when the two share no bit.  Bits of `requested`
/// outside `allowed` are dropped, so the result is always contained in
/// `allowed`.
pub fn check_operation(allowed: Operation, requested: Operation) -> Operation {
    if allowed.intersects(requested) {
        requested & allowed
    } else {
        Operation::NONE
    }
}

/// Visual drop-indicator hints shown by the client while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Feedback(u32);

impl Feedback {
    pub const NONE: Feedback = Feedback(0);
    pub const SELECT: Feedback = Feedback(1 << 0);
    pub const INSERT_BEFORE: Feedback = Feedback(1 << 1);
    pub const INSERT_AFTER: Feedback = Feedback(1 << 2);
    pub const SCROLL: Feedback = Feedback(1 << 3);
    pub const EXPAND: Feedback = Feedback(1 << 4);

    pub const fn from_bits(bits: u32) -> Self {
        Feedback(bits)
    }

    /// Converts the integer sent by the client; negative values mean "none".
    pub fn from_client_value(value: i32) -> Self {
        Feedback(u32::try_from(value).unwrap_or(0))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Feedback) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Feedback {
    type Output = Feedback;

    fn bitor(self, rhs: Feedback) -> Feedback {
        Feedback(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client_value_recognises_the_three_operations() {
        assert_eq!(Operation::from_client_value(Some("copy")), Operation::COPY);
        assert_eq!(Operation::from_client_value(Some("move")), Operation::MOVE);
        assert_eq!(Operation::from_client_value(Some("link")), Operation::LINK);
    }

    #[test]
    fn test_from_client_value_maps_unknown_and_absent_to_none() {
        assert_eq!(Operation::from_client_value(Some("COPY")), Operation::NONE);
        assert_eq!(Operation::from_client_value(Some("")), Operation::NONE);
        assert_eq!(Operation::from_client_value(None), Operation::NONE);
    }

    #[test]
    fn test_check_operation_keeps_allowed_request() {
        // Arrange
        let allowed = Operation::COPY | Operation::MOVE;

        // Act
        let result = check_operation(allowed, Operation::MOVE);

        // Assert
        assert_eq!(result, Operation::MOVE);
    }

    #[test]
    fn test_check_operation_coerces_disallowed_request_to_none() {
        let allowed = Operation::COPY;
        assert_eq!(check_operation(allowed, Operation::MOVE), Operation::NONE);
        assert_eq!(check_operation(allowed, Operation::NONE), Operation::NONE);
        assert_eq!(check_operation(Operation::NONE, Operation::COPY), Operation::NONE);
    }

    #[test]
    fn test_check_operation_never_returns_bits_outside_allowed() {
        // Exhaustive over every pair of 3-bit masks.
        for allowed in 0..8 {
            for requested in 0..8 {
                let allowed = Operation::from_bits(allowed);
                let requested = Operation::from_bits(requested);

                let result = check_operation(allowed, requested);

                assert!(
                    allowed.contains(result),
                    "{result} escapes allowed mask {allowed}"
                );
                if !allowed.intersects(requested) {
                    assert!(result.is_none());
                }
            }
        }
    }

    #[test]
    fn test_from_bits_drops_unknown_bits() {
        assert_eq!(Operation::from_bits(0xFF), Operation::ALL);
    }

    #[test]
    fn test_display_lists_set_operations() {
        assert_eq!(Operation::NONE.to_string(), "none");
        assert_eq!((Operation::COPY | Operation::LINK).to_string(), "copy|link");
    }

    #[test]
    fn test_feedback_negative_client_value_is_none() {
        assert_eq!(Feedback::from_client_value(-1), Feedback::NONE);
        assert_eq!(Feedback::from_client_value(3), Feedback::SELECT | Feedback::INSERT_BEFORE);
    }
}
