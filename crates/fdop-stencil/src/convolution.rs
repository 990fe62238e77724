//! Matrix-free stencil application for [`DerivativeOperator`].
//!
//! One input `x` of length `N + 2` (grid plus two ghost values) and one
//! output `y` of length `N`, in three ordered phases:
//!
//! ```text
//! left boundary  y[i]         = low[i]  · x[0 .. bsl]               i < bpc
//! interior       y[i]         = stencil · x[i+1-mid ..= i+1+mid]     bpc <= i < N-bpc
//! right boundary y[N-bpc+k]   = high[k] · x[N+2-bsl .. N+2]          k < bpc
//! ```
//!
//! followed by a single rescale of every output by `1/dx^d` (and by the
//! per-point coefficient when one is set). Stencil coefficients are defined
//! for unit spacing, so the spacing factor is applied once, not per phase.

use crate::derivative::DerivativeOperator;
use fdop_core::leaf::check_apply_buffers;
use fdop_core::{LeafOperator, OperatorError, Scalar};

/// `w · x` over equal-length slices.
#[inline]
pub(crate) fn dot<T: Scalar>(w: &[T], x: &[T]) -> T {
    w.iter()
        .zip(x)
        .fold(T::zero(), |acc, (wi, xi)| acc + *wi * *xi)
}

/// Apply `op` to the padded input `x`, writing `y`.
pub fn convolve_into<T: Scalar>(
    op: &DerivativeOperator<T>,
    x: &[T],
    y: &mut [T],
) -> Result<(), OperatorError> {
    check_apply_buffers(op.shape(), x.len(), y.len())?;

    convolve_left_boundary(op, x, y);
    convolve_interior(op, x, y);
    convolve_right_boundary(op, x, y);
    rescale(op, y);
    Ok(())
}

fn convolve_left_boundary<T: Scalar>(op: &DerivativeOperator<T>, x: &[T], y: &mut [T]) {
    let bsl = op.boundary_stencil_length();
    for (yi, row) in y.iter_mut().zip(op.low_boundary_coefficients()) {
        *yi = dot(row, &x[..bsl]);
    }
}

fn convolve_interior<T: Scalar>(op: &DerivativeOperator<T>, x: &[T], y: &mut [T]) {
    let n = y.len();
    let bpc = op.boundary_point_count();
    let stencil = op.stencil_coefficients();
    let sl = stencil.len();
    let mid = sl / 2;
    for i in bpc..n - bpc {
        let start = i + 1 - mid;
        y[i] = dot(stencil, &x[start..start + sl]);
    }
}

fn convolve_right_boundary<T: Scalar>(op: &DerivativeOperator<T>, x: &[T], y: &mut [T]) {
    let n = y.len();
    let bpc = op.boundary_point_count();
    let window = &x[x.len() - op.boundary_stencil_length()..];
    for (k, row) in op.high_boundary_coefficients().iter().enumerate() {
        y[n - bpc + k] = dot(row, window);
    }
}

fn rescale<T: Scalar>(op: &DerivativeOperator<T>, y: &mut [T]) {
    let scale = op.scale();
    match op.coefficients() {
        Some(c) => {
            for (yi, ci) in y.iter_mut().zip(c) {
                *yi *= scale * *ci;
            }
        }
        None => {
            for yi in y.iter_mut() {
                *yi *= scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize, dx: f64, f: impl Fn(f64) -> f64) -> Vec<f64> {
        // Padded nodes sit at (k - 1) * dx for k in 0..n+2.
        (0..n + 2).map(|k| f((k as f64 - 1.0) * dx)).collect()
    }

    #[test]
    fn second_derivative_of_quadratic() {
        let n = 10;
        let d = DerivativeOperator::centered(2, 2, 1.0, n).unwrap();
        let x = sample(n, 1.0, |s| s * s);
        let mut y = vec![0.0; n];
        convolve_into(&d, &x, &mut y).unwrap();
        for v in y {
            assert!((v - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn first_derivative_with_spacing() {
        let n = 8;
        let dx = 0.25;
        let d = DerivativeOperator::centered(1, 2, dx, n).unwrap();
        let x = sample(n, dx, |s| 3.0 * s + 1.0);
        let mut y = vec![0.0; n];
        convolve_into(&d, &x, &mut y).unwrap();
        for v in y {
            assert!((v - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn boundary_rows_exact_for_high_order() {
        // Fourth-order second derivative has one boundary row per side;
        // a quartic is reproduced exactly everywhere.
        let n = 12;
        let dx = 0.1;
        let d = DerivativeOperator::centered(2, 4, dx, n).unwrap();
        let x = sample(n, dx, |s| s.powi(4) - s.powi(3));
        let mut y = vec![0.0; n];
        convolve_into(&d, &x, &mut y).unwrap();
        for (i, v) in y.iter().enumerate() {
            let s = i as f64 * dx;
            let exact = 12.0 * s * s - 6.0 * s;
            assert!((v - exact).abs() < 1e-7, "row {i}: {v} vs {exact}");
        }
    }

    #[test]
    fn matches_materialized_matrix() {
        let n = 9;
        let d = DerivativeOperator::centered(3, 2, 0.5, n).unwrap();
        let x: Vec<f64> = (0..n + 2).map(|k| ((k * 7) % 5) as f64 - 2.0).collect();
        let mut y = vec![0.0; n];
        convolve_into(&d, &x, &mut y).unwrap();
        let m = d.to_matrix().unwrap();
        for i in 0..n {
            let row: f64 = (0..n + 2).map(|j| m[[i, j]] * x[j]).sum();
            assert!((row - y[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn variable_coefficients_scale_rows() {
        let n = 4;
        let d = DerivativeOperator::builder()
            .derivative_order(1)
            .dx(1.0)
            .len(n)
            .coefficients(vec![1.0, 2.0, 3.0, 4.0])
            .build()
            .unwrap();
        let x = sample(n, 1.0, |s| s);
        let mut y = vec![0.0; n];
        convolve_into(&d, &x, &mut y).unwrap();
        assert_eq!(y, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rejects_unpadded_input() {
        let d = DerivativeOperator::centered(2, 2, 1.0, 5).unwrap();
        let mut y = vec![0.0; 5];
        assert!(matches!(
            convolve_into(&d, &[0.0; 5], &mut y),
            Err(OperatorError::DimensionMismatch { .. })
        ));
    }
}
