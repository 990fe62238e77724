//! The [`LeafOperator`] contract for primitive operators.
//!
//! Every composite expression bottoms out in leaves. Derivative stencils,
//! boundary paddings and array-backed matrices are the built-in kinds; any
//! user operator that implements this trait participates in the algebra.

use crate::dense::unit_vector;
use crate::error::{check_index, check_len, OperatorError};
use crate::scalar::Scalar;
use ndarray::Array2;
use std::fmt;

/// Operator shape as `(rows, cols)`: output length by input length.
pub type Shape = (usize, usize);

/// A primitive (non-composite) linear operator.
///
/// # Contract
///
/// - `apply_into` maps an input of length `shape().1` into an output of
///   length `shape().0`, overwriting the output.
/// - `solve_into` is the inverse map (right-hand side of length `rows`,
///   solution of length `cols`); leaves that cannot invert return
///   [`OperatorError::UnsupportedOperation`].
/// - Leaves take `&self` for apply and solve; they hold no scratch state.
///
/// # Object safety
///
/// This trait is object-safe; composite operators store leaves as
/// `Box<dyn LeafOperator<T>>`.
///
/// # Examples
///
/// ```
/// use fdop_core::{LeafOperator, OperatorError, Shape};
///
/// #[derive(Debug, Clone)]
/// struct Doubler(usize);
///
/// impl LeafOperator<f64> for Doubler {
///     fn name(&self) -> &str { "Doubler" }
///     fn shape(&self) -> Shape { (self.0, self.0) }
///     fn apply_into(&self, x: &[f64], y: &mut [f64]) -> Result<(), OperatorError> {
///         for (yi, xi) in y.iter_mut().zip(x) {
///             *yi = 2.0 * xi;
///         }
///         Ok(())
///     }
///     fn box_clone(&self) -> Box<dyn LeafOperator<f64>> { Box::new(self.clone()) }
/// }
///
/// let m = Doubler(2).to_matrix().unwrap();
/// assert_eq!(m[[1, 1]], 2.0);
/// assert_eq!(m[[0, 1]], 0.0);
/// ```
pub trait LeafOperator<T: Scalar>: fmt::Debug + Send + Sync {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// `(rows, cols)` of the logical matrix.
    fn shape(&self) -> Shape;

    /// Compute `y = A x` into a caller-provided buffer.
    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError>;

    /// Compute `x = A \ b` into a caller-provided buffer.
    ///
    /// Default: unsupported.
    fn solve_into(&self, _b: &[T], _x: &mut [T]) -> Result<(), OperatorError> {
        Err(OperatorError::unsupported("solve", self.name()))
    }

    /// Materialize the dense matrix.
    ///
    /// Default implementation applies the operator to every unit vector;
    /// leaves with direct access to their entries should override it.
    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let (rows, cols) = self.shape();
        let mut m = Array2::zeros((rows, cols));
        let mut column = vec![T::zero(); rows];
        for j in 0..cols {
            let e = unit_vector(cols, j);
            self.apply_into(&e, &mut column)?;
            for (i, v) in column.iter().enumerate() {
                m[[i, j]] = *v;
            }
        }
        Ok(m)
    }

    /// Single element `A[row, col]` without materializing the matrix.
    ///
    /// Default implementation applies the operator to one unit vector.
    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        let shape = self.shape();
        check_index(row, col, shape)?;
        let e = unit_vector(shape.1, col);
        let mut y = vec![T::zero(); shape.0];
        self.apply_into(&e, &mut y)?;
        Ok(y[row])
    }

    /// Precompute a decomposition enabling repeated fast solves.
    ///
    /// Default: unsupported.
    fn factorize(&self) -> Result<Box<dyn LeafOperator<T>>, OperatorError> {
        Err(OperatorError::unsupported("factorize", self.name()))
    }

    /// `true` if the operator never changes under
    /// [`update_coefficients`](Self::update_coefficients).
    fn is_constant(&self) -> bool {
        true
    }

    /// Push new `(u, p, t)` state into any mutable coefficients.
    fn update_coefficients(&mut self, _u: &[T], _p: &[T], _t: T) {}

    /// Lower and upper bandwidths, if the leaf knows them without
    /// materializing.
    fn bandwidths(&self) -> Option<(usize, usize)> {
        None
    }

    /// Clone into a new boxed leaf.
    fn box_clone(&self) -> Box<dyn LeafOperator<T>>;
}

impl<T: Scalar> Clone for Box<dyn LeafOperator<T>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Validate the buffer lengths handed to an apply call.
pub fn check_apply_buffers(
    shape: Shape,
    x: usize,
    y: usize,
) -> Result<(), OperatorError> {
    check_len("apply", shape.1, x)?;
    check_len("apply", shape.0, y)
}

/// Validate the buffer lengths handed to a solve call.
pub fn check_solve_buffers(
    shape: Shape,
    b: usize,
    x: usize,
) -> Result<(), OperatorError> {
    check_len("solve", shape.0, b)?;
    check_len("solve", shape.1, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shifts its input down by one row, dropping the last entry.
    #[derive(Debug, Clone)]
    struct Shift(usize);

    impl LeafOperator<f64> for Shift {
        fn name(&self) -> &str {
            "Shift"
        }

        fn shape(&self) -> Shape {
            (self.0, self.0)
        }

        fn apply_into(&self, x: &[f64], y: &mut [f64]) -> Result<(), OperatorError> {
            check_apply_buffers(self.shape(), x.len(), y.len())?;
            y[0] = 0.0;
            y[1..].copy_from_slice(&x[..self.0 - 1]);
            Ok(())
        }

        fn box_clone(&self) -> Box<dyn LeafOperator<f64>> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn default_to_matrix_uses_unit_vectors() {
        let m = Shift(3).to_matrix().unwrap();
        assert_eq!(m[[1, 0]], 1.0);
        assert_eq!(m[[2, 1]], 1.0);
        assert_eq!(m[[0, 0]], 0.0);
        assert_eq!(m.sum(), 2.0);
    }

    #[test]
    fn default_get_matches_matrix() {
        let s = Shift(4);
        let m = s.to_matrix().unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(s.get(i, j).unwrap(), m[[i, j]]);
            }
        }
        assert!(s.get(4, 0).is_err());
    }

    #[test]
    fn defaults_reject_solve_and_factorize() {
        let s = Shift(2);
        let mut x = [0.0; 2];
        assert!(matches!(
            s.solve_into(&[1.0, 1.0], &mut x),
            Err(OperatorError::UnsupportedOperation { operation: "solve", .. })
        ));
        assert!(matches!(
            s.factorize(),
            Err(OperatorError::UnsupportedOperation { operation: "factorize", .. })
        ));
        assert!(s.is_constant());
    }

    #[test]
    fn boxed_leaf_clones() {
        let b: Box<dyn LeafOperator<f64>> = Box::new(Shift(2));
        let c = b.clone();
        assert_eq!(c.shape(), (2, 2));
    }

    #[test]
    fn apply_buffer_check_rejects_short_output() {
        let s = Shift(3);
        let mut y = [0.0; 2];
        assert!(s.apply_into(&[1.0, 2.0, 3.0], &mut y).is_err());
    }
}
