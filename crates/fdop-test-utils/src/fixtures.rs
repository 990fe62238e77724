//! Reusable leaf fixtures.
//!
//! - [`CountingLeaf`]: wraps an [`ArrayOperator`] and counts calls, so tests
//!   can check that composites reach (or skip) their leaves.
//! - [`time_fill_rule`] / [`time_filled_leaf`]: a leaf whose every entry is
//!   the current time `t`.

use fdop_core::{ArrayOperator, LeafOperator, OperatorError, Scalar, Shape};
use ndarray::Array2;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Matrix update rule filling every entry with `t`.
pub fn time_fill_rule<T: Scalar>() -> impl Fn(&mut Array2<T>, &[T], &[T], T) + Send + Sync + 'static
{
    |m: &mut Array2<T>, _u: &[T], _p: &[T], t: T| m.fill(t)
}

/// A `rows × cols` array leaf, initially zero, refilled with `t` on update.
pub fn time_filled_leaf<T: Scalar>(rows: usize, cols: usize) -> ArrayOperator<T> {
    ArrayOperator::with_update_rule(Array2::zeros((rows, cols)), time_fill_rule())
}

#[derive(Debug, Default)]
struct Counters {
    applies: AtomicUsize,
    solves: AtomicUsize,
    updates: AtomicUsize,
}

/// Array leaf that counts apply, solve and update calls.
///
/// Clones share counters, so a leaf moved into an operator tree can still be
/// inspected through a clone kept by the test.
#[derive(Clone, Debug)]
pub struct CountingLeaf<T> {
    inner: ArrayOperator<T>,
    counters: Arc<Counters>,
}

impl<T: Scalar> CountingLeaf<T> {
    pub fn new(inner: ArrayOperator<T>) -> Self {
        Self {
            inner,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Counting wrapper around a constant matrix.
    pub fn from_matrix(matrix: Array2<T>) -> Self {
        Self::new(ArrayOperator::new(matrix))
    }

    pub fn applies(&self) -> usize {
        self.counters.applies.load(Ordering::Relaxed)
    }

    pub fn solves(&self) -> usize {
        self.counters.solves.load(Ordering::Relaxed)
    }

    pub fn updates(&self) -> usize {
        self.counters.updates.load(Ordering::Relaxed)
    }
}

impl<T: Scalar> LeafOperator<T> for CountingLeaf<T> {
    fn name(&self) -> &str {
        "CountingLeaf"
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }

    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        self.counters.applies.fetch_add(1, Ordering::Relaxed);
        self.inner.apply_into(x, y)
    }

    fn solve_into(&self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        self.counters.solves.fetch_add(1, Ordering::Relaxed);
        self.inner.solve_into(b, x)
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        self.inner.to_matrix()
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        self.inner.get(row, col)
    }

    fn factorize(&self) -> Result<Box<dyn LeafOperator<T>>, OperatorError> {
        self.inner.factorize()
    }

    fn is_constant(&self) -> bool {
        self.inner.is_constant()
    }

    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        self.inner.update_coefficients(u, p, t);
    }

    fn box_clone(&self) -> Box<dyn LeafOperator<T>> {
        Box::new(self.clone())
    }
}
