//! Array-backed leaf operators.
//!
//! [`ArrayOperator`] wraps a dense matrix and optionally refills it from
//! `(u, p, t)` through a [`MatrixUpdateRule`]. [`FactorizedOperator`] is what
//! a square array operator (or a densely materialized composite) turns into
//! after `factorize()`: it applies with the original matrix and solves with
//! stored LU factors.

use crate::dense::{matvec_into, LuFactors};
use crate::error::{check_index, OperatorError};
use crate::leaf::{check_apply_buffers, check_solve_buffers, LeafOperator, Shape};
use crate::scalar::Scalar;
use ndarray::Array2;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Refills a matrix in place from the current state.
///
/// Any `Fn(&mut Array2<T>, &[T], &[T], T)` closure implements this trait.
pub trait MatrixUpdateRule<T>: Send + Sync {
    /// Overwrite `matrix` for state `u`, parameters `p` and time `t`.
    fn update(&self, matrix: &mut Array2<T>, u: &[T], p: &[T], t: T);
}

impl<T, F> MatrixUpdateRule<T> for F
where
    F: Fn(&mut Array2<T>, &[T], &[T], T) + Send + Sync,
{
    fn update(&self, matrix: &mut Array2<T>, u: &[T], p: &[T], t: T) {
        self(matrix, u, p, t)
    }
}

/// A leaf backed by a dense matrix.
///
/// # Examples
///
/// ```
/// use fdop_core::{ArrayOperator, LeafOperator};
/// use ndarray::array;
///
/// let a = ArrayOperator::new(array![[2.0, 0.0], [1.0, 1.0]]);
/// let mut y = [0.0; 2];
/// a.apply_into(&[1.0, 2.0], &mut y).unwrap();
/// assert_eq!(y, [2.0, 3.0]);
/// ```
#[derive(Clone)]
pub struct ArrayOperator<T> {
    matrix: Array2<T>,
    rule: Option<Arc<dyn MatrixUpdateRule<T>>>,
}

impl<T: Scalar> ArrayOperator<T> {
    /// A time-invariant array operator.
    pub fn new(matrix: Array2<T>) -> Self {
        Self { matrix, rule: None }
    }

    /// An array operator refilled by `rule` on every coefficient update.
    pub fn with_update_rule<F>(matrix: Array2<T>, rule: F) -> Self
    where
        F: Fn(&mut Array2<T>, &[T], &[T], T) + Send + Sync + 'static,
    {
        Self {
            matrix,
            rule: Some(Arc::new(rule)),
        }
    }

    /// Borrow the current matrix.
    pub fn matrix(&self) -> &Array2<T> {
        &self.matrix
    }
}

impl<T: fmt::Debug> fmt::Debug for ArrayOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayOperator")
            .field("shape", &self.matrix.dim())
            .field("has_rule", &self.rule.is_some())
            .finish()
    }
}

impl<T: Scalar> LeafOperator<T> for ArrayOperator<T> {
    fn name(&self) -> &str {
        "ArrayOperator"
    }

    fn shape(&self) -> Shape {
        self.matrix.dim()
    }

    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        matvec_into(&self.matrix, x, y)
    }

    fn solve_into(&self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        check_solve_buffers(self.shape(), b.len(), x.len())?;
        LuFactors::new(&self.matrix)?.solve_into(b, x)
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        Ok(self.matrix.clone())
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        check_index(row, col, self.shape())?;
        Ok(self.matrix[[row, col]])
    }

    fn factorize(&self) -> Result<Box<dyn LeafOperator<T>>, OperatorError> {
        Ok(Box::new(FactorizedOperator::from_matrix(self.matrix.clone())?))
    }

    fn is_constant(&self) -> bool {
        self.rule.is_none()
    }

    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        if let Some(rule) = &self.rule {
            rule.update(&mut self.matrix, u, p, t);
        }
    }

    fn box_clone(&self) -> Box<dyn LeafOperator<T>> {
        Box::new(self.clone())
    }
}

/// A square matrix together with its LU factors.
///
/// A factorization is a snapshot: it is always constant, and coefficient
/// updates do not touch it. Refactorize after updating the source operator.
#[derive(Clone, Debug)]
pub struct FactorizedOperator<T> {
    matrix: Array2<T>,
    factors: LuFactors<T>,
}

impl<T: Scalar> FactorizedOperator<T> {
    /// Factorize `matrix`, which must be square and non-singular.
    pub fn from_matrix(matrix: Array2<T>) -> Result<Self, OperatorError> {
        let factors = LuFactors::new(&matrix)?;
        debug!(dim = factors.dim(), "dense LU factorization");
        Ok(Self { matrix, factors })
    }

    /// The stored LU factors.
    pub fn factors(&self) -> &LuFactors<T> {
        &self.factors
    }
}

impl<T: Scalar> LeafOperator<T> for FactorizedOperator<T> {
    fn name(&self) -> &str {
        "FactorizedOperator"
    }

    fn shape(&self) -> Shape {
        self.matrix.dim()
    }

    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_apply_buffers(self.shape(), x.len(), y.len())?;
        matvec_into(&self.matrix, x, y)
    }

    fn solve_into(&self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        self.factors.solve_into(b, x)
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        Ok(self.matrix.clone())
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        check_index(row, col, self.shape())?;
        Ok(self.matrix[[row, col]])
    }

    fn factorize(&self) -> Result<Box<dyn LeafOperator<T>>, OperatorError> {
        Ok(Box::new(self.clone()))
    }

    fn box_clone(&self) -> Box<dyn LeafOperator<T>> {
        Box::new(self.clone())
    }
}
