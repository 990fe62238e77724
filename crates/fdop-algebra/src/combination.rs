//! `op[0] + op[1] + ... + op[k]`.

use crate::operator::Operator;
use crate::protocol::LinearOperator;
use fdop_core::leaf::check_apply_buffers;
use fdop_core::{
    matrix_norm, FactorizedOperator, LuFactors, NormKind, OperatorError, Scalar, Shape,
};
use ndarray::Array2;
use tracing::debug;

/// Sum of two or more operators of identical shape.
///
/// Applies operand by operand, accumulating through one scratch vector the
/// size of the output. A sum has no structural inverse, so `solve` and
/// `factorize` go through the dense LU of the materialized matrix.
#[derive(Clone, Debug)]
pub struct OperatorCombination<T: Scalar> {
    ops: Vec<Operator<T>>,
    cache: Vec<T>,
}

impl<T: Scalar> OperatorCombination<T> {
    /// Sum `ops`, which must hold at least two operators of equal shape.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidConfig`] with fewer than two operands
    /// - [`OperatorError::DimensionMismatch`] if any operand's shape differs
    ///   from the first
    pub fn new(ops: Vec<Operator<T>>) -> Result<Self, OperatorError> {
        let shape = match ops.as_slice() {
            [first, _, ..] => first.shape(),
            _ => {
                return Err(OperatorError::invalid_config(
                    "a combination needs at least two operands",
                ))
            }
        };
        if let Some(bad) = ops.iter().find(|op| op.shape() != shape) {
            return Err(OperatorError::DimensionMismatch {
                operation: "add",
                expected: shape,
                found: bad.shape(),
            });
        }
        debug!(
            operands = ops.len(),
            rows = shape.0,
            cols = shape.1,
            "built operator combination"
        );
        Ok(Self {
            cache: vec![T::zero(); shape.0],
            ops,
        })
    }

    /// The summed operands.
    pub fn operands(&self) -> &[Operator<T>] {
        &self.ops
    }

    pub(crate) fn into_operands(self) -> Vec<Operator<T>> {
        self.ops
    }

    fn dense_factors(&self) -> Result<LuFactors<T>, OperatorError> {
        let (rows, cols) = self.shape();
        debug!(rows, cols, "combination solve falls back to dense LU");
        LuFactors::new(&self.to_matrix()?)
    }
}

impl<T: Scalar> LinearOperator<T> for OperatorCombination<T> {
    fn shape(&self) -> Shape {
        (self.cache.len(), self.ops[0].shape().1)
    }

    fn apply_into(&mut self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_apply_buffers(self.shape(), x.len(), y.len())?;
        let Some((first, rest)) = self.ops.split_first_mut() else {
            return Ok(());
        };
        first.apply_into(x, y)?;
        for op in rest {
            op.apply_into(x, &mut self.cache)?;
            for (yi, ci) in y.iter_mut().zip(&self.cache) {
                *yi += *ci;
            }
        }
        Ok(())
    }

    fn apply(&self, x: &[T]) -> Result<Vec<T>, OperatorError> {
        let mut y = vec![T::zero(); self.cache.len()];
        for op in &self.ops {
            for (yi, vi) in y.iter_mut().zip(op.apply(x)?) {
                *yi += vi;
            }
        }
        Ok(y)
    }

    fn solve_into(&mut self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        self.dense_factors()?.solve_into(b, x)
    }

    fn solve(&self, b: &[T]) -> Result<Vec<T>, OperatorError> {
        self.dense_factors()?.solve(b)
    }

    fn norm(&self, kind: NormKind) -> Result<T, OperatorError> {
        Ok(matrix_norm(&self.to_matrix()?, kind))
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        let mut sum = T::zero();
        for op in &self.ops {
            sum += op.get(row, col)?;
        }
        Ok(sum)
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let mut m = Array2::zeros(self.shape());
        for op in &self.ops {
            m += &op.to_matrix()?;
        }
        Ok(m)
    }

    fn factorize(&self) -> Result<Operator<T>, OperatorError> {
        Ok(Operator::leaf(FactorizedOperator::from_matrix(
            self.to_matrix()?,
        )?))
    }

    fn children(&self) -> &[Operator<T>] {
        &self.ops
    }

    fn children_mut(&mut self) -> &mut [Operator<T>] {
        &mut self.ops
    }
}
