//! The [`LinearOperator`] protocol shared by every node of an operator tree.

use crate::operator::Operator;
use fdop_core::{NormKind, OperatorError, Scalar, Shape};
use ndarray::Array2;

/// Linear-algebra operations every operator node supports.
///
/// `apply_into` and `solve_into` take `&mut self` because composite nodes
/// reuse instance-owned scratch buffers; `apply` and `solve` take `&self`
/// and allocate per call, so they may run concurrently on a shared tree.
///
/// Coefficient updates and constancy recurse over [`children`] by default;
/// nodes with local coefficients override them and then recurse.
///
/// [`children`]: LinearOperator::children
pub trait LinearOperator<T: Scalar> {
    /// `(rows, cols)` of the logical matrix.
    fn shape(&self) -> Shape;

    /// `y = A x` into a caller-provided buffer, reusing internal scratch.
    fn apply_into(&mut self, x: &[T], y: &mut [T]) -> Result<(), OperatorError>;

    /// `A x` into a freshly allocated vector.
    fn apply(&self, x: &[T]) -> Result<Vec<T>, OperatorError>;

    /// `x = A \ b` into a caller-provided buffer, reusing internal scratch.
    fn solve_into(&mut self, b: &[T], x: &mut [T]) -> Result<(), OperatorError>;

    /// `A \ b` into a freshly allocated vector.
    fn solve(&self, b: &[T]) -> Result<Vec<T>, OperatorError>;

    /// Operator norm of the selected kind.
    fn norm(&self, kind: NormKind) -> Result<T, OperatorError>;

    /// Single element `A[row, col]`.
    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError>;

    /// Materialize the dense matrix.
    fn to_matrix(&self) -> Result<Array2<T>, OperatorError>;

    /// An equivalent operator prepared for repeated solves.
    fn factorize(&self) -> Result<Operator<T>, OperatorError>;

    /// Direct children in the operator tree; empty for leaves.
    fn children(&self) -> &[Operator<T>];

    /// Mutable access to the direct children.
    fn children_mut(&mut self) -> &mut [Operator<T>];

    /// `true` if no reachable coefficient or leaf changes on update.
    fn is_constant(&self) -> bool {
        self.children().iter().all(|c| c.is_constant())
    }

    /// Push `(u, p, t)` into every reachable coefficient and leaf.
    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        for child in self.children_mut() {
            child.update_coefficients(u, p, t);
        }
    }
}
