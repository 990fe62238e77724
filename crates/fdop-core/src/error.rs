//! Error type for operator construction and evaluation.
//!
//! Construction-time checks (shape compatibility, grid size, builder
//! validation) fail fast before any apply. Numeric failures (zero scalar
//! coefficient, singular pivot) are reported from the call that hits them.

use std::error::Error;
use std::fmt;

/// Errors from building or evaluating a linear operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatorError {
    /// Operand shapes are incompatible for the requested operation.
    DimensionMismatch {
        /// The operation that detected the mismatch (e.g. `"add"`).
        operation: &'static str,
        /// The shape or length the operation required.
        expected: (usize, usize),
        /// The shape or length it was given.
        found: (usize, usize),
    },
    /// Division or solve through a zero scalar coefficient.
    SingularCoefficient,
    /// The grid is smaller than the stencil footprint.
    GridTooSmall {
        /// Number of grid points requested.
        len: usize,
        /// Minimum number of grid points the stencil needs.
        required: usize,
    },
    /// The operation is not supported by this operator kind.
    UnsupportedOperation {
        /// The requested operation (e.g. `"factorize"`).
        operation: &'static str,
        /// Name of the operator that rejected it.
        operator: String,
    },
    /// Dense LU factorization hit a zero pivot.
    SingularMatrix {
        /// Column at which elimination broke down.
        pivot: usize,
    },
    /// An element lookup fell outside the operator's shape.
    IndexOutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Shape of the operator, `(rows, cols)`.
        shape: (usize, usize),
    },
    /// A builder was given missing or invalid parameters.
    InvalidConfig {
        /// What went wrong.
        reason: String,
    },
}

impl OperatorError {
    /// Shorthand for [`OperatorError::UnsupportedOperation`].
    pub fn unsupported(operation: &'static str, operator: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation,
            operator: operator.into(),
        }
    }

    /// Shorthand for [`OperatorError::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for OperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                operation,
                expected,
                found,
            } => write!(
                f,
                "{operation}: dimension mismatch, expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            Self::SingularCoefficient => write!(f, "scalar coefficient is zero"),
            Self::GridTooSmall { len, required } => {
                write!(f, "grid of {len} points is too small, stencil needs {required}")
            }
            Self::UnsupportedOperation {
                operation,
                operator,
            } => write!(f, "{operation} is not supported by {operator}"),
            Self::SingularMatrix { pivot } => {
                write!(f, "matrix is singular (negligible pivot in column {pivot})")
            }
            Self::IndexOutOfBounds { row, col, shape } => write!(
                f,
                "index ({row}, {col}) out of bounds for {}x{} operator",
                shape.0, shape.1
            ),
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl Error for OperatorError {}

/// Check that a vector has the length an operation requires.
///
/// Vector lengths are reported as `(len, 1)` shapes.
pub fn check_len(operation: &'static str, expected: usize, found: usize) -> Result<(), OperatorError> {
    if expected == found {
        Ok(())
    } else {
        Err(OperatorError::DimensionMismatch {
            operation,
            expected: (expected, 1),
            found: (found, 1),
        })
    }
}

/// Check that `(row, col)` lies inside `shape`.
pub fn check_index(row: usize, col: usize, shape: (usize, usize)) -> Result<(), OperatorError> {
    if row < shape.0 && col < shape.1 {
        Ok(())
    } else {
        Err(OperatorError::IndexOutOfBounds { row, col, shape })
    }
}
