//! Centered-difference derivative operator.
//!
//! Maps a padded input of `N + 2` values (grid plus one ghost point per
//! side) to the discretized derivative at the `N` grid points. Interior rows
//! use one symmetric stencil; the first and last `boundary_point_count` rows
//! use one-sided stencils of `boundary_stencil_length` points.
//!
//! Constructed via the builder pattern: [`DerivativeOperator::builder`].

use crate::convolution;
use crate::fornberg::{fornberg_weights, offsets, StencilRow};
use fdop_core::error::check_index;
use fdop_core::{LeafOperator, OperatorError, Scalar, Shape};
use ndarray::Array2;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Refills per-point variable coefficients from the current state.
///
/// Any `Fn(&mut [T], &[T], &[T], T)` closure implements this trait.
pub trait VectorUpdateRule<T>: Send + Sync {
    /// Overwrite `coefficients` for state `u`, parameters `p` and time `t`.
    fn update(&self, coefficients: &mut [T], u: &[T], p: &[T], t: T);
}

impl<T, F> VectorUpdateRule<T> for F
where
    F: Fn(&mut [T], &[T], &[T], T) + Send + Sync,
{
    fn update(&self, coefficients: &mut [T], u: &[T], p: &[T], t: T) {
        self(coefficients, u, p, t)
    }
}

/// A centered finite-difference derivative operator on a uniform grid.
///
/// Logical shape is `N × (N+2)`. With `d` the derivative order and `p`
/// the (even) approximation order:
///
/// ```text
/// stencil_length          = d + p - 1 + (d + p) % 2
/// boundary_stencil_length = d + p
/// boundary_point_count    = stencil_length / 2 - 1
/// ```
///
/// Stencil coefficients assume unit spacing; the convolution rescales by
/// `1 / dx^d` once at the end. An optional per-point coefficient vector
/// multiplies each output row after rescaling.
///
/// # Construction
///
/// ```
/// use fdop_stencil::DerivativeOperator;
///
/// let d2 = DerivativeOperator::builder()
///     .derivative_order(2)
///     .approximation_order(2)
///     .dx(1.0)
///     .len(10)
///     .build()
///     .unwrap();
/// assert_eq!(d2.stencil_coefficients(), &[1.0, -2.0, 1.0]);
/// assert_eq!(d2.boundary_point_count(), 0);
/// ```
#[derive(Clone)]
pub struct DerivativeOperator<T> {
    derivative_order: usize,
    approximation_order: usize,
    dx: T,
    len: usize,
    stencil_length: usize,
    stencil_coefs: StencilRow<T>,
    boundary_point_count: usize,
    boundary_stencil_length: usize,
    low_boundary_coefs: Vec<StencilRow<T>>,
    high_boundary_coefs: Vec<StencilRow<T>>,
    coefficients: Option<Vec<T>>,
    coefficient_rule: Option<Arc<dyn VectorUpdateRule<T>>>,
}

/// Builder for [`DerivativeOperator`].
///
/// Required fields: `derivative_order`, `dx` and `len`. The approximation
/// order defaults to 2; variable coefficients default to none.
pub struct DerivativeOperatorBuilder<T> {
    derivative_order: Option<usize>,
    approximation_order: usize,
    dx: Option<T>,
    len: Option<usize>,
    coefficients: Option<Vec<T>>,
    coefficient_rule: Option<Arc<dyn VectorUpdateRule<T>>>,
}

impl<T: Scalar> DerivativeOperator<T> {
    /// Create a new builder for configuring a `DerivativeOperator`.
    pub fn builder() -> DerivativeOperatorBuilder<T> {
        DerivativeOperatorBuilder {
            derivative_order: None,
            approximation_order: 2,
            dx: None,
            len: None,
            coefficients: None,
            coefficient_rule: None,
        }
    }

    /// Shorthand for a constant-coefficient centered difference.
    pub fn centered(
        derivative_order: usize,
        approximation_order: usize,
        dx: T,
        len: usize,
    ) -> Result<Self, OperatorError> {
        Self::builder()
            .derivative_order(derivative_order)
            .approximation_order(approximation_order)
            .dx(dx)
            .len(len)
            .build()
    }

    /// Order of the derivative being approximated.
    pub fn derivative_order(&self) -> usize {
        self.derivative_order
    }

    /// Formal order of accuracy.
    pub fn approximation_order(&self) -> usize {
        self.approximation_order
    }

    /// Grid spacing.
    pub fn dx(&self) -> T {
        self.dx
    }

    /// Number of grid points `N`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always returns `false`: construction rejects grids smaller than the
    /// stencil.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Width of the interior stencil (odd).
    pub fn stencil_length(&self) -> usize {
        self.stencil_length
    }

    /// Interior stencil coefficients, unit spacing.
    pub fn stencil_coefficients(&self) -> &[T] {
        &self.stencil_coefs
    }

    /// Rows on each side that use a one-sided boundary stencil.
    pub fn boundary_point_count(&self) -> usize {
        self.boundary_point_count
    }

    /// Width of the one-sided boundary stencils.
    pub fn boundary_stencil_length(&self) -> usize {
        self.boundary_stencil_length
    }

    /// Boundary rows near the start, first row first.
    pub fn low_boundary_coefficients(&self) -> &[StencilRow<T>] {
        &self.low_boundary_coefs
    }

    /// Boundary rows near the end, first row first. Coefficient `j` pairs
    /// with `x[N + 2 - boundary_stencil_length + j]`.
    pub fn high_boundary_coefficients(&self) -> &[StencilRow<T>] {
        &self.high_boundary_coefs
    }

    /// Per-point variable coefficients, if any.
    pub fn coefficients(&self) -> Option<&[T]> {
        self.coefficients.as_deref()
    }

    /// The global `1 / dx^d` factor applied after convolution.
    pub fn scale(&self) -> T {
        T::one() / self.dx.powi(self.derivative_order as i32)
    }

    /// Total multiplier for output row `i`: the global scale times the
    /// row's variable coefficient.
    pub(crate) fn row_scale(&self, i: usize) -> T {
        match &self.coefficients {
            Some(c) => self.scale() * c[i],
            None => self.scale(),
        }
    }

    /// Start of the input window and the unit-spacing coefficients for
    /// output row `i`.
    pub(crate) fn row_stencil(&self, i: usize) -> (usize, &[T]) {
        let n = self.len;
        let bpc = self.boundary_point_count;
        if i < bpc {
            (0, self.low_boundary_coefs[i].as_slice())
        } else if i >= n - bpc {
            (
                n + 2 - self.boundary_stencil_length,
                self.high_boundary_coefs[i - (n - bpc)].as_slice(),
            )
        } else {
            (i + 1 - self.stencil_length / 2, self.stencil_coefs.as_slice())
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DerivativeOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivativeOperator")
            .field("derivative_order", &self.derivative_order)
            .field("approximation_order", &self.approximation_order)
            .field("dx", &self.dx)
            .field("len", &self.len)
            .field("stencil_length", &self.stencil_length)
            .field("boundary_point_count", &self.boundary_point_count)
            .field("has_coefficients", &self.coefficients.is_some())
            .field("has_rule", &self.coefficient_rule.is_some())
            .finish()
    }
}

impl<T: Scalar> DerivativeOperatorBuilder<T> {
    /// Set the derivative order (at least 1).
    pub fn derivative_order(mut self, order: usize) -> Self {
        self.derivative_order = Some(order);
        self
    }

    /// Set the approximation order (positive and even).
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

    /// Set per-point variable coefficients (one per grid point).
    pub fn coefficients(mut self, coefficients: Vec<T>) -> Self {
        self.coefficients = Some(coefficients);
        self
    }

    /// Recompute the variable coefficients on every coefficient update.
    ///
    /// Without explicit [`coefficients`](Self::coefficients) the vector
    /// starts at all ones.
    pub fn coefficient_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&mut [T], &[T], &[T], T) + Send + Sync + 'static,
    {
        self.coefficient_rule = Some(Arc::new(rule));
        self
    }

    /// Build the operator, validating all configuration.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidConfig`] if `derivative_order`, `dx` or
    ///   `len` is missing, an order is zero, the approximation order is odd,
    ///   `dx` is not positive, or the coefficient vector has the wrong length
    /// - [`OperatorError::GridTooSmall`] if `len` is smaller than the
    ///   stencil footprint
    pub fn build(self) -> Result<DerivativeOperator<T>, OperatorError> {
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

        if d == 0 {
            return Err(OperatorError::invalid_config("derivative_order must be at least 1"));
        }
        if p == 0 || p % 2 != 0 {
            return Err(OperatorError::invalid_config(format!(
                "centered differences need a positive even approximation_order, got {p}"
            )));
        }
        if !(dx > T::zero()) || !dx.is_finite() {
            return Err(OperatorError::invalid_config(format!(
                "dx must be positive and finite, got {dx}"
            )));
        }

        let stencil_length = d + p - 1 + (d + p) % 2;
        let boundary_stencil_length = d + p;
        let mid = stencil_length / 2;
        let boundary_point_count = mid - 1;

        let required = stencil_length.max(boundary_stencil_length.saturating_sub(2));
        if len < required {
            return Err(OperatorError::GridTooSmall { len, required });
        }

        let coefficients = match (self.coefficients, &self.coefficient_rule) {
            (Some(c), _) => {
                if c.len() != len {
                    return Err(OperatorError::invalid_config(format!(
                        "expected {len} coefficients, got {}",
                        c.len()
                    )));
                }
                Some(c)
            }
            (None, Some(_)) => Some(vec![T::one(); len]),
            (None, None) => None,
        };

        let stencil_coefs = fornberg_weights(d, T::zero(), &offsets::<T>(-(mid as i64), stencil_length))?;

        let boundary_nodes: StencilRow<T> = offsets(0, boundary_stencil_length);
        let low_boundary_coefs = (0..boundary_point_count)
            .map(|i| fornberg_weights(d, T::cast((i + 1) as f64), &boundary_nodes))
            .collect::<Result<Vec<_>, _>>()?;
        let high_boundary_coefs = (0..boundary_point_count)
            .map(|k| {
                let z = boundary_stencil_length - boundary_point_count + k - 1;
                fornberg_weights(d, T::cast(z as f64), &boundary_nodes)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            derivative_order = d,
            approximation_order = p,
            len,
            stencil_length,
            boundary_point_count,
            "built derivative operator"
        );

        Ok(DerivativeOperator {
            derivative_order: d,
            approximation_order: p,
            dx,
            len,
            stencil_length,
            stencil_coefs,
            boundary_point_count,
            boundary_stencil_length,
            low_boundary_coefs,
            high_boundary_coefs,
            coefficients,
            coefficient_rule: self.coefficient_rule,
        })
    }
}

impl<T: Scalar> LeafOperator<T> for DerivativeOperator<T> {
    fn name(&self) -> &str {
        "DerivativeOperator"
    }

    fn shape(&self) -> Shape {
        (self.len, self.len + 2)
    }

    fn apply_into(&self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        convolution::convolve_into(self, x, y)
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let mut m = Array2::zeros(self.shape());
        for i in 0..self.len {
            let (start, w) = self.row_stencil(i);
            let s = self.row_scale(i);
            for (k, wk) in w.iter().enumerate() {
                m[[i, start + k]] = *wk * s;
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
        Ok(w[col - start] * self.row_scale(row))
    }

    fn is_constant(&self) -> bool {
        self.coefficient_rule.is_none()
    }

    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        if let (Some(rule), Some(c)) = (&self.coefficient_rule, self.coefficients.as_mut()) {
            rule.update(c, u, p, t);
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
