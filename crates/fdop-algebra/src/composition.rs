//! `ops[last] ∘ ... ∘ ops[1] ∘ ops[0]`.
//!
//! Stages are stored in application order: `A ∘ B` is stored as `[B, A]`.
//! Stage `k < last` writes into scratch slot `k`, sized to that stage's
//! output; the last stage writes into the caller's buffer. Solves walk the
//! same slots from the other end.

use crate::operator::Operator;
use crate::protocol::LinearOperator;
use fdop_core::error::check_index;
use fdop_core::leaf::{check_apply_buffers, check_solve_buffers};
use fdop_core::{unit_vector, FactorizedOperator, LuFactors, NormKind, OperatorError, Scalar, Shape};
use ndarray::Array2;
use tracing::debug;

/// A chain of operators applied one after another.
///
/// The chain need not be square. Stage-wise solves need every stage square;
/// otherwise a square chain falls back to the dense LU of its product.
#[derive(Clone, Debug)]
pub struct OperatorComposition<T: Scalar> {
    ops: Vec<Operator<T>>,
    caches: Vec<Vec<T>>,
}

impl<T: Scalar> OperatorComposition<T> {
    /// Chain `ops`, first applied first.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidConfig`] with fewer than two stages
    /// - [`OperatorError::DimensionMismatch`] if a stage's output length is
    ///   not the next stage's input length
    pub fn new(ops: Vec<Operator<T>>) -> Result<Self, OperatorError> {
        if ops.len() < 2 {
            return Err(OperatorError::invalid_config(
                "a composition needs at least two stages",
            ));
        }
        for pair in ops.windows(2) {
            let (inner, outer) = (pair[0].shape(), pair[1].shape());
            if inner.0 != outer.1 {
                return Err(OperatorError::DimensionMismatch {
                    operation: "compose",
                    expected: (outer.0, inner.0),
                    found: outer,
                });
            }
        }
        let caches = ops[..ops.len() - 1]
            .iter()
            .map(|op| vec![T::zero(); op.shape().0])
            .collect();
        debug!(stages = ops.len(), "built operator composition");
        Ok(Self { ops, caches })
    }

    /// Stages in application order.
    pub fn stages(&self) -> &[Operator<T>] {
        &self.ops
    }

    pub(crate) fn into_stages(self) -> Vec<Operator<T>> {
        self.ops
    }

    fn stages_square(&self) -> bool {
        self.ops.iter().all(|op| {
            let (rows, cols) = op.shape();
            rows == cols
        })
    }

    fn dense_factors(&self) -> Result<LuFactors<T>, OperatorError> {
        let (rows, cols) = self.shape();
        debug!(rows, cols, "composition solve falls back to dense LU");
        LuFactors::new(&self.to_matrix()?)
    }
}

impl<T: Scalar> LinearOperator<T> for OperatorComposition<T> {
    fn shape(&self) -> Shape {
        let rows = self.ops[self.ops.len() - 1].shape().0;
        let cols = self.ops[0].shape().1;
        (rows, cols)
    }

    fn apply_into(&mut self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_apply_buffers(self.shape(), x.len(), y.len())?;
        let last = self.ops.len() - 1;
        for (k, op) in self.ops.iter_mut().enumerate() {
            let (done, pending) = self.caches.split_at_mut(k);
            let input: &[T] = if k == 0 { x } else { &done[k - 1] };
            if k == last {
                op.apply_into(input, y)?;
            } else {
                op.apply_into(input, &mut pending[0])?;
            }
        }
        Ok(())
    }

    fn apply(&self, x: &[T]) -> Result<Vec<T>, OperatorError> {
        let mut v = self.ops[0].apply(x)?;
        for op in &self.ops[1..] {
            v = op.apply(&v)?;
        }
        Ok(v)
    }

    fn solve_into(&mut self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        check_solve_buffers(self.shape(), b.len(), x.len())?;
        if !self.stages_square() {
            return self.dense_factors()?.solve_into(b, x);
        }
        let last = self.ops.len() - 1;
        for k in (0..=last).rev() {
            let (before, from_k) = self.caches.split_at_mut(k);
            let rhs: &[T] = if k == last { b } else { &from_k[0] };
            let op = &mut self.ops[k];
            if k == 0 {
                op.solve_into(rhs, x)?;
            } else {
                op.solve_into(rhs, &mut before[k - 1])?;
            }
        }
        Ok(())
    }

    fn solve(&self, b: &[T]) -> Result<Vec<T>, OperatorError> {
        if !self.stages_square() {
            return self.dense_factors()?.solve(b);
        }
        let mut v = b.to_vec();
        for op in self.ops.iter().rev() {
            v = op.solve(&v)?;
        }
        Ok(v)
    }

    /// Product of the stage norms.
    ///
    /// Operator norms are submultiplicative, so this is an upper bound on
    /// the norm of the product, not its exact value.
    fn norm(&self, kind: NormKind) -> Result<T, OperatorError> {
        let mut product = T::one();
        for op in &self.ops {
            product *= op.norm(kind)?;
        }
        Ok(product)
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        let shape = self.shape();
        check_index(row, col, shape)?;
        let column = self.apply(&unit_vector(shape.1, col))?;
        Ok(column[row])
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let mut product = self.ops[0].to_matrix()?;
        for op in &self.ops[1..] {
            product = op.to_matrix()?.dot(&product);
        }
        Ok(product)
    }

    fn factorize(&self) -> Result<Operator<T>, OperatorError> {
        if self.stages_square() {
            let stages = self
                .ops
                .iter()
                .map(|op| op.factorize())
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Operator::Composition(Self::new(stages)?));
        }
        debug!("composition factorize falls back to dense LU");
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn a() -> Operator<f64> {
        Operator::from_matrix(array![[1.0, 2.0], [0.0, 1.0]])
    }

    fn b() -> Operator<f64> {
        Operator::from_matrix(array![[3.0, 0.0], [1.0, 2.0]])
    }

    #[test]
    fn applies_first_stage_first() {
        // [b, a] means a(b(x)).
        let mut c = OperatorComposition::new(vec![b(), a()]).unwrap();
        let x = [1.0, 1.0];
        let expected = a().apply(&b().apply(&x).unwrap()).unwrap();
        let mut y = [0.0; 2];
        c.apply_into(&x, &mut y).unwrap();
        assert_eq!(y.to_vec(), expected);
        assert_eq!(c.apply(&x).unwrap(), expected);
    }

    #[test]
    fn rectangular_chain_shape() {
        let p = Operator::from_matrix(Array2::<f64>::ones((4, 3)));
        let q = Operator::from_matrix(Array2::<f64>::ones((2, 4)));
        let mut c = OperatorComposition::new(vec![p, q]).unwrap();
        assert_eq!(c.shape(), (2, 3));
        let mut y = [0.0; 2];
        c.apply_into(&[1.0, 1.0, 1.0], &mut y).unwrap();
        assert_eq!(y, [12.0, 12.0]);
    }

    #[test]
    fn adjacent_shapes_checked() {
        let p = Operator::from_matrix(Array2::<f64>::ones((4, 3)));
        let q = Operator::from_matrix(Array2::<f64>::ones((2, 3)));
        assert!(matches!(
            OperatorComposition::new(vec![p, q]),
            Err(OperatorError::DimensionMismatch { operation: "compose", .. })
        ));
    }

    #[test]
    fn staged_solve_inverts_apply() {
        let mut c = OperatorComposition::new(vec![b(), a()]).unwrap();
        let rhs = c.apply(&[2.0, -1.0]).unwrap();
        let mut x = [0.0; 2];
        c.solve_into(&rhs, &mut x).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-12 && (x[1] + 1.0).abs() < 1e-12);
        assert_eq!(c.solve(&rhs).unwrap(), x.to_vec());
    }

    #[test]
    fn matrix_is_dense_product() {
        let c = OperatorComposition::new(vec![b(), a()]).unwrap();
        let expected = a().to_matrix().unwrap().dot(&b().to_matrix().unwrap());
        assert_eq!(c.to_matrix().unwrap(), expected);
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(c.get(i, j).unwrap(), expected[[i, j]]);
            }
        }
        assert!(c.get(2, 0).is_err());
    }

    #[test]
    fn norm_is_product_upper_bound() {
        let c = OperatorComposition::new(vec![b(), a()]).unwrap();
        let bound = c.norm(NormKind::One).unwrap();
        assert_eq!(bound, a().norm(NormKind::One).unwrap() * b().norm(NormKind::One).unwrap());
        let exact = fdop_core::matrix_norm(&c.to_matrix().unwrap(), NormKind::One);
        assert!(exact <= bound);
    }

    #[test]
    fn factorize_stagewise() {
        let c = OperatorComposition::new(vec![b(), a()]).unwrap();
        let f = c.factorize().unwrap();
        assert!(matches!(f, Operator::Composition(_)));
        let rhs = [1.0, 3.0];
        let direct = c.solve(&rhs).unwrap();
        let fast = f.solve(&rhs).unwrap();
        for (d, s) in direct.iter().zip(&fast) {
            assert!((d - s).abs() < 1e-12);
        }
    }

    #[test]
    fn square_chain_of_rectangular_stages_uses_dense_solve() {
        // (2x3) after (3x2) is square.
        let p = Operator::<f64>::from_matrix(array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let q = Operator::from_matrix(array![[1.0, 0.0, 1.0], [0.0, 2.0, 0.0]]);
        let c = OperatorComposition::new(vec![p, q]).unwrap();
        let x = c.solve(&[2.0, 2.0]).unwrap();
        let back = c.apply(&x).unwrap();
        assert!((back[0] - 2.0).abs() < 1e-12 && (back[1] - 2.0).abs() < 1e-12);
        assert!(matches!(c.factorize().unwrap(), Operator::Leaf(_)));
    }
}
