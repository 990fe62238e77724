//! One-sided (upwind) derivative operator.
//!
//! Each output row picks a forward or backward window of `d + p` padded
//! points from a direction table. Windows that would run past either end of
//! the padded input are clamped inside it, and the row uses the weights for
//! its shifted evaluation point. Rows are independent, so application runs
//! over the output in parallel.

use crate::convolution::dot;
use crate::fornberg::{fornberg_weights, offsets, StencilRow};
use fdop_core::error::{check_index, check_len};
use fdop_core::leaf::check_apply_buffers;
use fdop_core::{LeafOperator, OperatorError, Scalar, Shape};
use ndarray::Array2;
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which side of a grid point a row's stencil leans towards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Window starts at the point and extends towards higher indices.
    #[default]
    Forward,
    /// Window ends at the point and extends towards lower indices.
    Backward,
}

/// Recomputes the direction table from the current state.
///
/// Any `Fn(&mut [Direction], &[T], &[T], T)` closure implements this trait.
pub trait DirectionRule<T>: Send + Sync {
    /// Overwrite `directions` for state `u`, parameters `p` and time `t`.
    fn update(&self, directions: &mut [Direction], u: &[T], p: &[T], t: T);
}

impl<T, F> DirectionRule<T> for F
where
    F: Fn(&mut [Direction], &[T], &[T], T) + Send + Sync,
{
    fn update(&self, directions: &mut [Direction], u: &[T], p: &[T], t: T) {
        self(directions, u, p, t)
    }
}

/// An upwind finite-difference derivative on a uniform grid.
///
/// Shape is `N × (N+2)`, like [`DerivativeOperator`](crate::DerivativeOperator).
/// The stencil spans `d + p` points for derivative order `d` and
/// approximation order `p` (any `p >= 1`).
///
/// ```
/// use fdop_core::LeafOperator;
/// use fdop_stencil::{Direction, UpwindOperator};
///
/// let mut up = UpwindOperator::builder()
///     .derivative_order(1)
///     .approximation_order(1)
///     .dx(1.0)
///     .len(4)
///     .build()
///     .unwrap();
/// up.set_directions(vec![Direction::Backward; 4]).unwrap();
/// let x = [0.0, 1.0, 4.0, 9.0, 16.0, 25.0];
/// let mut y = [0.0; 4];
/// up.apply_into(&x, &mut y).unwrap();
/// assert_eq!(y, [1.0, 3.0, 5.0, 7.0]);
/// ```
#[derive(Clone)]
pub struct UpwindOperator<T> {
    derivative_order: usize,
    approximation_order: usize,
    dx: T,
    len: usize,
    stencil_length: usize,
    weights_by_offset: Vec<StencilRow<T>>,
    directions: Vec<Direction>,
    direction_rule: Option<Arc<dyn DirectionRule<T>>>,
}

/// Builder for [`UpwindOperator`].
///
/// Required fields: `derivative_order`, `dx` and `len`. The approximation
/// order defaults to 1 and every row defaults to [`Direction::Forward`].
pub struct UpwindOperatorBuilder<T> {
    derivative_order: Option<usize>,
    approximation_order: usize,
    dx: Option<T>,
    len: Option<usize>,
    directions: Option<Vec<Direction>>,
    direction_rule: Option<Arc<dyn DirectionRule<T>>>,
}

impl<T: Scalar> UpwindOperator<T> {
    /// Create a new builder for configuring an `UpwindOperator`.
    pub fn builder() -> UpwindOperatorBuilder<T> {
        UpwindOperatorBuilder {
            derivative_order: None,
            approximation_order: 1,
            dx: None,
            len: None,
            directions: None,
            direction_rule: None,
        }
    }

    /// Order of the derivative being approximated.
    pub fn derivative_order(&self) -> usize {
        self.derivative_order
    }

    /// Formal order of accuracy.
    pub fn approximation_order(&self) -> usize {
        self.approximation_order
    }

    /// Number of grid points `N`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always returns `false`: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Points per stencil window.
    pub fn stencil_length(&self) -> usize {
        self.stencil_length
    }

    /// Current direction of every row.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Replace the direction table.
    pub fn set_directions(&mut self, directions: Vec<Direction>) -> Result<(), OperatorError> {
        check_len("set_directions", self.len, directions.len())?;
        self.directions = directions;
        Ok(())
    }

    fn scale(&self) -> T {
        T::one() / self.dx.powi(self.derivative_order as i32)
    }

    /// Window start and unit-spacing weights for output row `i`.
    fn row_stencil(&self, i: usize) -> (usize, &[T]) {
        let pos = i + 1;
        let last_start = self.len + 2 - self.stencil_length;
        let start = match self.directions[i] {
            Direction::Forward => pos.min(last_start),
            Direction::Backward => (pos + 1).saturating_sub(self.stencil_length).min(last_start),
        };
        (start, self.weights_by_offset[pos - start].as_slice())
    }
}

impl<T: fmt::Debug> fmt::Debug for UpwindOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpwindOperator")
            .field("derivative_order", &self.derivative_order)
            .field("approximation_order", &self.approximation_order)
            .field("dx", &self.dx)
            .field("len", &self.len)
            .field("stencil_length", &self.stencil_length)
            .field("has_rule", &self.direction_rule.is_some())
            .finish()
    }
}

impl<T: Scalar> UpwindOperatorBuilder<T> {
    /// Set the derivative order (at least 1).
    pub fn derivative_order(mut self, order: usize) -> Self {
        self.derivative_order = Some(order);
        self
    }

    /// Set the approximation order (at least 1).
    pub fn approximation_order(mut self, order: usize) -> Self {
        self.approximation_order = order;
        self
    }

    /// Set the grid spacing (positive, finite).
    pub fn dx(mut self, dx: T) -> Self {
        self.dx = Some(dx);
        self
    }

    /// Set the number of grid points.
    pub fn len(mut self, len: usize) -> Self {
        self.len = Some(len);
        self
    }

    /// Set the initial direction of every row.
    pub fn directions(mut self, directions: Vec<Direction>) -> Self {
        self.directions = Some(directions);
        self
    }

    /// Recompute the direction table on every coefficient update.
    pub fn direction_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&mut [Direction], &[T], &[T], T) + Send + Sync + 'static,
    {
        self.direction_rule = Some(Arc::new(rule));
        self
    }

    /// Build the operator, validating all configuration.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidConfig`] for missing fields, zero orders,
    ///   a non-positive `dx` or a direction table of the wrong length
    /// - [`OperatorError::GridTooSmall`] if the padded input is shorter than
    ///   one stencil window
    pub fn build(self) -> Result<UpwindOperator<T>, OperatorError> {
        let d = self
            .derivative_order
            .ok_or_else(|| OperatorError::invalid_config("derivative_order is required"))?;
        let dx = self
            .dx
            .ok_or_else(|| OperatorError::invalid_config("dx is required"))?;
        let len = self
            .len
            .ok_or_else(|| OperatorError::invalid_config("len is required"))?;
        let p = self.approximation_order;

        if d == 0 || p == 0 {
            return Err(OperatorError::invalid_config(
                "derivative_order and approximation_order must be at least 1",
            ));
        }
        if !(dx > T::zero()) || !dx.is_finite() {
            return Err(OperatorError::invalid_config(format!(
                "dx must be positive and finite, got {dx}"
            )));
        }

        let stencil_length = d + p;
        let required = stencil_length.saturating_sub(2).max(1);
        if len < required {
            return Err(OperatorError::GridTooSmall { len, required });
        }

        let directions = match self.directions {
            Some(dirs) if dirs.len() != len => {
                return Err(OperatorError::invalid_config(format!(
                    "expected {len} directions, got {}",
                    dirs.len()
                )));
            }
            Some(dirs) => dirs,
            None => vec![Direction::Forward; len],
        };

        let nodes: StencilRow<T> = offsets(0, stencil_length);
        let weights_by_offset = (0..stencil_length)
            .map(|k| fornberg_weights(d, T::cast(k as f64), &nodes))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            derivative_order = d,
            approximation_order = p,
            len,
            stencil_length,
            "built upwind operator"
        );

        Ok(UpwindOperator {
            derivative_order: d,
            approximation_order: p,
            dx,
            len,
            stencil_length,
            weights_by_offset,
            directions,
            direction_rule: self.direction_rule,
        })
    }
}

impl<T: Scalar> LeafOperator<T> for UpwindOperator<T> {
    fn name(&self) -> &str {
        "UpwindOperator"
    }

    fn shape(&self) -> Shape {
        (self.len, self.len + 2)
    }

    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        check_apply_buffers(self.shape(), x.len(), y.len())?;
        let scale = self.scale();
        y.par_iter_mut().enumerate().for_each(|(i, yi)| {
            let (start, w) = self.row_stencil(i);
            *yi = dot(w, &x[start..start + w.len()]) * scale;
        });
        Ok(())
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let mut m = Array2::zeros(self.shape());
        let scale = self.scale();
        for i in 0..self.len {
            let (start, w) = self.row_stencil(i);
            for (k, wk) in w.iter().enumerate() {
                m[[i, start + k]] = *wk * scale;
            }
        }
        Ok(m)
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        check_index(row, col, self.shape())?;
        let (start, w) = self.row_stencil(row);
        if col < start || col >= start + w.len() {
            return Ok(T::zero());
        }
        Ok(w[col - start] * self.scale())
    }

    fn is_constant(&self) -> bool {
        self.direction_rule.is_none()
    }

    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        if let Some(rule) = &self.direction_rule {
            rule.update(&mut self.directions, u, p, t);
            trace!(len = self.len, "upwind directions updated");
        }
    }

    fn bandwidths(&self) -> Option<(usize, usize)> {
        let mut lower = 0;
        let mut upper = 0;
        for i in 0..self.len {
            let (start, w) = self.row_stencil(i);
            lower = lower.max(i.saturating_sub(start));
            upper = upper.max((start + w.len() - 1).saturating_sub(i));
        }
        Some((lower, upper))
    }

    fn box_clone(&self) -> Box<dyn LeafOperator<T>> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_order(len: usize) -> UpwindOperator<f64> {
        UpwindOperator::builder()
            .derivative_order(1)
            .dx(1.0)
            .len(len)
            .build()
            .unwrap()
    }

    #[test]
    fn forward_rows_are_one_sided() {
        let up = first_order(4);
        let m = up.to_matrix().unwrap();
        // Row 0 reads padded positions 1 and 2.
        assert_eq!(m[[0, 1]], -1.0);
        assert_eq!(m[[0, 2]], 1.0);
        // Last row is clamped back onto the final two padded points.
        assert_eq!(m[[3, 4]], -1.0);
        assert_eq!(m[[3, 5]], 1.0);
    }

    #[test]
    fn backward_rows_lean_left() {
        let mut up = first_order(4);
        up.set_directions(vec![Direction::Backward; 4]).unwrap();
        let m = up.to_matrix().unwrap();
        for i in 0..4 {
            assert_eq!(m[[i, i]], -1.0);
            assert_eq!(m[[i, i + 1]], 1.0);
        }
    }

    #[test]
    fn clamped_windows_use_shifted_weights() {
        // Second-order first derivative: three-point windows.
        let mut up = UpwindOperator::<f64>::builder()
            .derivative_order(1)
            .approximation_order(2)
            .dx(1.0)
            .len(3)
            .build()
            .unwrap();
        up.set_directions(vec![Direction::Backward; 3]).unwrap();
        // Row 0 at padded position 1 cannot look two points back; it uses
        // nodes 0..3 evaluated at offset 1, the centered stencil.
        let expect = |row: usize, col: usize, v: f64| {
            let got = up.get(row, col).unwrap();
            assert!((got - v).abs() < 1e-12, "({row}, {col}): {got} vs {v}");
        };
        expect(0, 0, -0.5);
        expect(0, 1, 0.0);
        expect(0, 2, 0.5);
        // Row 2 has a full backward window ending at padded position 3.
        expect(2, 1, 0.5);
        expect(2, 2, -2.0);
        expect(2, 3, 1.5);
    }

    #[test]
    fn parallel_apply_matches_matrix() {
        let n = 64;
        let mut up = UpwindOperator::<f64>::builder()
            .derivative_order(2)
            .approximation_order(2)
            .dx(0.1)
            .len(n)
            .build()
            .unwrap();
        let dirs = (0..n)
            .map(|i| if i % 3 == 0 { Direction::Backward } else { Direction::Forward })
            .collect();
        up.set_directions(dirs).unwrap();
        let x: Vec<f64> = (0..n + 2).map(|k| (k as f64 * 0.37).sin()).collect();
        let mut y = vec![0.0; n];
        up.apply_into(&x, &mut y).unwrap();
        let m = up.to_matrix().unwrap();
        for i in 0..n {
            let serial: f64 = (0..n + 2).map(|j| m[[i, j]] * x[j]).sum();
            assert!((serial - y[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn direction_rule_flips_rows() {
        let mut up = UpwindOperator::<f64>::builder()
            .derivative_order(1)
            .dx(1.0)
            .len(3)
            .direction_rule(|dirs: &mut [Direction], u: &[f64], _p: &[f64], _t: f64| {
                for (d, ui) in dirs.iter_mut().zip(u) {
                    *d = if *ui >= 0.0 { Direction::Backward } else { Direction::Forward };
                }
            })
            .build()
            .unwrap();
        assert!(!up.is_constant());
        up.update_coefficients(&[1.0, -1.0, 1.0], &[], 0.0);
        assert_eq!(
            up.directions(),
            &[Direction::Backward, Direction::Forward, Direction::Backward]
        );
    }

    #[test]
    fn builder_validation() {
        assert!(matches!(
            UpwindOperator::<f64>::builder().dx(1.0).len(3).build(),
            Err(OperatorError::InvalidConfig { .. })
        ));
        assert!(matches!(
            UpwindOperator::<f64>::builder()
                .derivative_order(3)
                .approximation_order(3)
                .dx(1.0)
                .len(3)
                .build(),
            Err(OperatorError::GridTooSmall { len: 3, required: 4 })
        ));
        let mut up = first_order(3);
        assert!(up.set_directions(vec![Direction::Forward; 2]).is_err());
    }
}
