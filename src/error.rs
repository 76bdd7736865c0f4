//! Error type shared by all fallible operations.
//!
//! Every variant is a programming-contract violation (mismatched shapes,
//! out-of-range requests), never a transient fault, so nothing is retried:
//! operations fail fast and surface the error to the caller unchanged.

use std::fmt;

/// Errors raised by derivative-structure operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DsError {
    /// Two operands disagree in free-parameter count or derivation order.
    DimensionMismatch { expected: usize, actual: usize },
    /// A requested derivation-order vector sums past the compiler's order.
    OrderExceeded { sum: usize, max: usize },
    /// A request exceeds what a first-order-only type can represent, or an
    /// index is outside the valid range.
    IndexOutOfRange { index: usize, limit: usize },
    /// A factorial in Taylor evaluation would overflow.
    ArithmeticOverflow { argument: usize },
    /// The Jacobian of a Taylor map is not invertible.
    SingularMatrix,
}

impl fmt::Display for DsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DsError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            DsError::OrderExceeded { sum, max } => {
                write!(f, "derivation order {sum} exceeds maximum order {max}")
            }
            DsError::IndexOutOfRange { index, limit } => {
                write!(f, "index {index} out of range [0, {limit})")
            }
            DsError::ArithmeticOverflow { argument } => {
                write!(f, "factorial({argument}) overflows")
            }
            DsError::SingularMatrix => {
                write!(f, "matrix is singular")
            }
        }
    }
}

impl std::error::Error for DsError {}
