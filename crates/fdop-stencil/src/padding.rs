//! Homogeneous ghost-point padding.
//!
//! A [`BoundaryPadding`] maps grid values `x` (length `N`) to the padded
//! vector `[g_lo, x_0, ..., x_{N-1}, g_hi]` that derivative operators read.
//! The ghost values are linear in `x`, so padding is an ordinary leaf and
//! `D ∘ Q` is a square `N × N` operator.

use fdop_core::error::check_index;
use fdop_core::leaf::check_apply_buffers;
use fdop_core::{LeafOperator, OperatorError, Scalar, Shape};
use ndarray::Array2;
use std::marker::PhantomData;

/// Ghost-value rule at both ends of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// Ghosts are zero.
    Dirichlet0,
    /// Ghosts copy the adjacent grid value (zero one-sided slope).
    Neumann0,
    /// Ghosts wrap around to the opposite end.
    Periodic,
}

/// Padding leaf of shape `(N + 2) × N`.
#[derive(Clone, Debug)]
pub struct BoundaryPadding<T> {
    len: usize,
    kind: BoundaryKind,
    _scalar: PhantomData<T>,
}

impl<T: Scalar> BoundaryPadding<T> {
    /// Padding of `len` grid values with the given ghost rule.
    pub fn new(len: usize, kind: BoundaryKind) -> Self {
        Self {
            len,
            kind,
            _scalar: PhantomData,
        }
    }

    /// Zero ghosts.
    pub fn dirichlet0(len: usize) -> Self {
        Self::new(len, BoundaryKind::Dirichlet0)
    }

    /// Ghosts equal to the first and last grid values.
    pub fn neumann0(len: usize) -> Self {
        Self::new(len, BoundaryKind::Neumann0)
    }

    /// Ghosts taken from the opposite end.
    pub fn periodic(len: usize) -> Self {
        Self::new(len, BoundaryKind::Periodic)
    }

    /// The ghost rule.
    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    /// Grid columns feeding the low and high ghosts, if any.
    fn ghost_sources(&self) -> Option<(usize, usize)> {
        let last = self.len.checked_sub(1)?;
        match self.kind {
            BoundaryKind::Dirichlet0 => None,
            BoundaryKind::Neumann0 => Some((0, last)),
            BoundaryKind::Periodic => Some((last, 0)),
        }
    }
}

impl<T: Scalar> LeafOperator<T> for BoundaryPadding<T> {
    fn name(&self) -> &str {
        "BoundaryPadding"
    }

    fn shape(&self) -> Shape {
        (self.len + 2, self.len)
    }

    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_apply_buffers(self.shape(), x.len(), y.len())?;
        let n = self.len;
        y[1..=n].copy_from_slice(x);
        let (lo, hi) = match self.ghost_sources() {
            Some((lo, hi)) => (x[lo], x[hi]),
            None => (T::zero(), T::zero()),
        };
        y[0] = lo;
        y[n + 1] = hi;
        Ok(())
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let n = self.len;
        let mut m = Array2::zeros(self.shape());
        for j in 0..n {
            m[[j + 1, j]] = T::one();
        }
        if let Some((lo, hi)) = self.ghost_sources() {
            m[[0, lo]] = T::one();
            m[[n + 1, hi]] = T::one();
        }
        Ok(m)
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        check_index(row, col, self.shape())?;
        let hit = if row == 0 {
            self.ghost_sources().is_some_and(|(lo, _)| lo == col)
        } else if row == self.len + 1 {
            self.ghost_sources().is_some_and(|(_, hi)| hi == col)
        } else {
            row == col + 1
        };
        Ok(if hit { T::one() } else { T::zero() })
    }

    fn box_clone(&self) -> Box<dyn LeafOperator<T>> {
        Box::new(self.clone())
    }
}
