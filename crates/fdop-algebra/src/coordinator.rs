//! Coefficient updates over a whole operator tree.
//!
//! Update rules live on scalar coefficients and leaves; they run only when
//! one of these entry points pushes a new `(u, p, t)` down the tree. Every
//! call recomputes from scratch, so repeating it with identical arguments
//! leaves the tree unchanged.

use crate::operator::Operator;
use crate::protocol::LinearOperator;
use fdop_core::{OperatorError, Scalar};
use ndarray::Array2;
use tracing::trace;

/// Push `(u, p, t)` into every coefficient and leaf reachable from `op`,
/// depth-first.
pub fn update_coefficients<T: Scalar>(op: &mut Operator<T>, u: &[T], p: &[T], t: T) {
    trace!(t = ?t, state_len = u.len(), params_len = p.len(), "updating coefficients");
    op.update_coefficients(u, p, t);
}

/// `true` if nothing reachable from `op` carries an update rule.
pub fn is_constant<T: Scalar>(op: &Operator<T>) -> bool {
    op.is_constant()
}

/// Update coefficients, then materialize the dense matrix.
pub fn evaluate<T: Scalar>(
    op: &mut Operator<T>,
    u: &[T],
    p: &[T],
    t: T,
) -> Result<Array2<T>, OperatorError> {
    update_coefficients(op, u, p, t);
    op.to_matrix()
}
