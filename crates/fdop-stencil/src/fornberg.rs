//! Finite-difference weights on arbitrary nodes (Fornberg's algorithm).
//!
//! Given nodes `x_0..x_n`, an evaluation point `z` and a derivative order
//! `m`, produces weights `w` such that `Σ w_j f(x_j) ≈ f^(m)(z)`, exact for
//! polynomials of degree `n`. Weights assume unit node spacing when the
//! nodes are integer offsets; operators rescale by `1/dx^m` afterwards.

use fdop_core::{OperatorError, Scalar};
use smallvec::SmallVec;

/// One row of stencil coefficients.
///
/// Stencils up to eight points wide (fourth derivative at fourth order
/// and below) stay on the stack.
pub type StencilRow<T> = SmallVec<[T; 8]>;

/// Weights of the `order`-th derivative at `z` on `nodes`.
///
/// Requires more nodes than the derivative order and pairwise distinct
/// nodes.
///
/// ```
/// use fdop_stencil::fornberg_weights;
///
/// let w = fornberg_weights(2, 0.0, &[-1.0, 0.0, 1.0]).unwrap();
/// assert_eq!(w.as_slice(), &[1.0, -2.0, 1.0]);
/// ```
pub fn fornberg_weights<T: Scalar>(
    order: usize,
    z: T,
    nodes: &[T],
) -> Result<StencilRow<T>, OperatorError> {
    let n = nodes.len();
    if n <= order {
        return Err(OperatorError::invalid_config(format!(
            "derivative order {order} needs more than {n} nodes"
        )));
    }
    for (i, a) in nodes.iter().enumerate() {
        if nodes[i + 1..].iter().any(|b| b == a) {
            return Err(OperatorError::invalid_config(format!(
                "stencil nodes must be distinct (duplicate {a})"
            )));
        }
    }

    // c[j][k]: weight of node j for the k-th derivative.
    let mut c = vec![vec![T::zero(); order + 1]; n];
    c[0][0] = T::one();
    let mut c1 = T::one();
    let mut c4 = nodes[0] - z;

    for i in 1..n {
        let mn = i.min(order);
        let mut c2 = T::one();
        let c5 = c4;
        c4 = nodes[i] - z;
        for j in 0..i {
            let c3 = nodes[i] - nodes[j];
            c2 *= c3;
            if j == i - 1 {
                for k in (1..=mn).rev() {
                    let kt = T::cast(k as f64);
                    c[i][k] = c1 * (kt * c[i - 1][k - 1] - c5 * c[i - 1][k]) / c2;
                }
                c[i][0] = -c1 * c5 * c[i - 1][0] / c2;
            }
            for k in (1..=mn).rev() {
                let kt = T::cast(k as f64);
                c[j][k] = (c4 * c[j][k] - kt * c[j][k - 1]) / c3;
            }
            c[j][0] = c4 * c[j][0] / c3;
        }
        c1 = c2;
    }

    Ok(c.iter().map(|row| row[order]).collect())
}

/// Integer offsets `start, start + 1, ..., start + len - 1` as scalars.
pub(crate) fn offsets<T: Scalar>(start: i64, len: usize) -> StencilRow<T> {
    (0..len as i64).map(|k| T::cast((start + k) as f64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_row(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn central_first_derivative() {
        let w = fornberg_weights(1, 0.0, &[-1.0, 0.0, 1.0]).unwrap();
        assert_row(&w, &[-0.5, 0.0, 0.5]);
    }

    #[test]
    fn central_second_derivative_fourth_order() {
        let w = fornberg_weights(2, 0.0, &offsets::<f64>(-2, 5)).unwrap();
        assert_row(
            &w,
            &[-1.0 / 12.0, 4.0 / 3.0, -5.0 / 2.0, 4.0 / 3.0, -1.0 / 12.0],
        );
    }

    #[test]
    fn one_sided_first_derivative() {
        let w = fornberg_weights(1, 0.0, &[0.0, 1.0, 2.0]).unwrap();
        assert_row(&w, &[-1.5, 2.0, -0.5]);
    }

    #[test]
    fn interpolation_weights_at_node() {
        // Zeroth derivative at a node is the unit selector.
        let w = fornberg_weights(0, 1.0, &[0.0, 1.0, 2.0]).unwrap();
        assert_row(&w, &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn weights_sum_to_zero_for_derivatives() {
        for order in 1..4 {
            let w = fornberg_weights(order, 0.3, &offsets::<f64>(-2, 6)).unwrap();
            let sum: f64 = w.iter().sum();
            assert!(sum.abs() < 1e-10, "order {order}: sum {sum}");
        }
    }

    #[test]
    fn too_few_nodes_rejected() {
        assert!(matches!(
            fornberg_weights(2, 0.0, &[0.0, 1.0]),
            Err(OperatorError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn duplicate_nodes_rejected() {
        assert!(fornberg_weights(1, 0.0, &[0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn offsets_are_consecutive() {
        let o: StencilRow<f64> = offsets(-1, 3);
        assert_eq!(o.as_slice(), &[-1.0, 0.0, 1.0]);
    }
}
