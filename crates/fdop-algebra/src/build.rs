//! Named constructors for composite operators.
//!
//! These are the canonical way to combine operators; the arithmetic
//! overloads in [`crate::ops`] delegate here. Sums flatten into one
//! combination and chains concatenate into one composition, so repeated
//! `+` or `*` never nests nodes of the same kind.

use crate::combination::OperatorCombination;
use crate::composition::OperatorComposition;
use crate::operator::Operator;
use crate::scaled::ScaledOperator;
use crate::protocol::LinearOperator;
use fdop_core::{LuFactors, OperatorError, Scalar, ScalarValue};
use ndarray::Array2;
use tracing::debug;

/// `c * op`.
///
/// Scaling an already scaled operator by a constant folds both constants
/// into one coefficient.
pub fn scale<T: Scalar>(op: Operator<T>, c: impl Into<ScalarValue<T>>) -> Operator<T> {
    let c = c.into();
    match op {
        Operator::Scaled(inner) if c.is_constant() && inner.coefficient().is_constant() => {
            let (coeff, op) = inner.into_parts();
            Operator::Scaled(ScaledOperator::new(c.value() * coeff.value(), op))
        }
        op => Operator::Scaled(ScaledOperator::new(c, op)),
    }
}

/// `-op`, as a scale by `-1`.
pub fn negate<T: Scalar>(op: Operator<T>) -> Operator<T> {
    scale(op, -T::one())
}

/// `op / c`.
///
/// # Errors
///
/// [`OperatorError::SingularCoefficient`] if `c` is zero.
pub fn divide_by_scalar<T: Scalar>(op: Operator<T>, c: T) -> Result<Operator<T>, OperatorError> {
    if c == T::zero() {
        return Err(OperatorError::SingularCoefficient);
    }
    Ok(scale(op, T::one() / c))
}

fn summands<T: Scalar>(op: Operator<T>) -> Vec<Operator<T>> {
    match op {
        Operator::Combination(sum) => sum.into_operands(),
        op => vec![op],
    }
}

/// `a + b`, flattening existing sums.
///
/// # Errors
///
/// [`OperatorError::DimensionMismatch`] if the shapes differ.
pub fn add<T: Scalar>(a: Operator<T>, b: Operator<T>) -> Result<Operator<T>, OperatorError> {
    let mut ops = summands(a);
    ops.extend(summands(b));
    OperatorCombination::new(ops).map(Operator::Combination)
}

/// `a - b`, as `a + (-b)`.
pub fn sub<T: Scalar>(a: Operator<T>, b: Operator<T>) -> Result<Operator<T>, OperatorError> {
    add(a, negate(b))
}

fn stages<T: Scalar>(op: Operator<T>) -> Vec<Operator<T>> {
    match op {
        Operator::Composition(chain) => chain.into_stages(),
        op => vec![op],
    }
}

/// `a ∘ b`: apply `b`, then `a`.
///
/// Existing chains concatenate, `b`'s stages first.
///
/// # Errors
///
/// [`OperatorError::DimensionMismatch`] if `b`'s output length is not
/// `a`'s input length.
pub fn compose<T: Scalar>(a: Operator<T>, b: Operator<T>) -> Result<Operator<T>, OperatorError> {
    let mut ops = stages(b);
    ops.extend(stages(a));
    OperatorComposition::new(ops).map(Operator::Composition)
}

/// Operator product `a * b`, identical to [`compose`].
pub fn multiply<T: Scalar>(a: Operator<T>, b: Operator<T>) -> Result<Operator<T>, OperatorError> {
    compose(a, b)
}

/// `a \ b`: the operator `X` with `A X = B`.
///
/// `a` is factorized once and every column of `b` is solved against it, so
/// the result is a dense array leaf.
///
/// # Errors
///
/// - [`OperatorError::DimensionMismatch`] if `a` and `b` differ in rows
/// - whatever `a.factorize()` or its solves report, e.g.
///   [`OperatorError::SingularMatrix`]
pub fn left_divide<T: Scalar>(a: Operator<T>, b: Operator<T>) -> Result<Operator<T>, OperatorError> {
    let (a_rows, a_cols) = a.shape();
    let (b_rows, b_cols) = b.shape();
    if a_rows != b_rows {
        return Err(OperatorError::DimensionMismatch {
            operation: "left_divide",
            expected: (a_rows, b_cols),
            found: (b_rows, b_cols),
        });
    }
    let factored = a.factorize()?;
    let rhs = b.to_matrix()?;
    debug!(rows = a_cols, cols = b_cols, "left division");
    let mut x = Array2::zeros((a_cols, b_cols));
    for (j, column) in rhs.columns().into_iter().enumerate() {
        for (i, v) in factored.solve(&column.to_vec())?.into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    Ok(Operator::from_matrix(x))
}

/// `a / b`: the operator `X` with `X B = A`, i.e. `A B⁻¹`.
///
/// Solved row by row against the LU factors of `Bᵀ`; the result is a dense
/// array leaf.
///
/// # Errors
///
/// - [`OperatorError::DimensionMismatch`] if `a`'s columns differ from
///   `b`'s or `b` is not square
/// - [`OperatorError::SingularMatrix`] if `b` is singular
pub fn right_divide<T: Scalar>(a: Operator<T>, b: Operator<T>) -> Result<Operator<T>, OperatorError> {
    let (a_rows, a_cols) = a.shape();
    let (b_rows, b_cols) = b.shape();
    if a_cols != b_rows {
        return Err(OperatorError::DimensionMismatch {
            operation: "right_divide",
            expected: (a_cols, b_cols),
            found: (b_rows, b_cols),
        });
    }
    let factors = LuFactors::new(&b.to_matrix()?.t().to_owned())?;
    let lhs = a.to_matrix()?;
    debug!(rows = a_rows, cols = b_cols, "right division");
    let mut x = Array2::zeros((a_rows, b_cols));
    for (i, row) in lhs.rows().into_iter().enumerate() {
        for (j, v) in factors.solve(&row.to_vec())?.into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    Ok(Operator::from_matrix(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn eye(n: usize) -> Operator<f64> {
        Operator::from_matrix(Array2::eye(n))
    }

    #[test]
    fn constant_scales_fold() {
        let op = scale(scale(eye(2), 2.0), 3.0);
        match &op {
            Operator::Scaled(s) => {
                assert_eq!(s.coefficient().value(), 6.0);
                assert!(matches!(s.inner(), Operator::Leaf(_)));
            }
            other => panic!("expected scaled, got {other:?}"),
        }
    }

    #[test]
    fn time_dependent_scale_nests() {
        let rule = ScalarValue::with_rule(1.0, |_v: f64, _u: &[f64], _p: &[f64], t: f64| t);
        let op = scale(scale(eye(2), 2.0), rule);
        match &op {
            Operator::Scaled(s) => assert!(matches!(s.inner(), Operator::Scaled(_))),
            other => panic!("expected scaled, got {other:?}"),
        }
    }

    #[test]
    fn sums_flatten() {
        let s = add(add(eye(2), eye(2)).unwrap(), add(eye(2), eye(2)).unwrap()).unwrap();
        assert_eq!(s.children().len(), 4);
        assert_eq!(s.apply(&[1.0, 2.0]).unwrap(), vec![4.0, 8.0]);
    }

    #[test]
    fn sub_is_add_negated() {
        let a = Operator::from_matrix(array![[3.0, 1.0], [0.0, 2.0]]);
        let d = sub(a.clone(), a).unwrap();
        assert_eq!(d.to_matrix().unwrap(), Array2::<f64>::zeros((2, 2)));
    }

    #[test]
    fn chains_concatenate_in_application_order() {
        let a = Operator::from_matrix(array![[2.0]]);
        let b = Operator::from_matrix(array![[3.0]]);
        let c = Operator::from_matrix(array![[5.0]]);
        let ab = compose(a, b).unwrap();
        let abc = compose(ab, c).unwrap();
        let stages: Vec<f64> = abc
            .children()
            .iter()
            .map(|s| s.get(0, 0).unwrap())
            .collect();
        assert_eq!(stages, vec![5.0, 3.0, 2.0]);
        assert_eq!(abc.apply(&[1.0]).unwrap(), vec![30.0]);
    }

    #[test]
    fn compose_checks_dimensions() {
        let tall = Operator::from_matrix(Array2::<f64>::zeros((3, 2)));
        assert!(matches!(
            compose(tall.clone(), tall),
            Err(OperatorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn left_divide_solves_each_column() {
        let a = Operator::from_matrix(array![[2.0, 0.0], [1.0, 4.0]]);
        let x_true: Array2<f64> = array![[1.0, 2.0, -1.0], [2.0, 1.0, 0.5]];
        let b = Operator::from_matrix(array![[2.0f64, 0.0], [1.0, 4.0]].dot(&x_true));
        let x = left_divide(a, b).unwrap().to_matrix().unwrap();
        assert_eq!(x.dim(), (2, 3));
        for (got, want) in x.iter().zip(x_true.iter()) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn right_divide_undoes_right_multiplication() {
        let b: Array2<f64> = array![[2.0, 1.0], [0.0, 4.0]];
        let x_true: Array2<f64> = array![[1.0, 1.0], [4.0, -1.0], [0.0, 3.0]];
        let a = Operator::from_matrix(x_true.dot(&b));
        let x = right_divide(a, Operator::from_matrix(b)).unwrap().to_matrix().unwrap();
        assert_eq!(x.dim(), (3, 2));
        for (got, want) in x.iter().zip(x_true.iter()) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn division_checks_shapes_and_singularity() {
        assert!(matches!(
            left_divide(eye(2), eye(3)),
            Err(OperatorError::DimensionMismatch { operation: "left_divide", .. })
        ));
        assert!(matches!(
            right_divide(eye(2), eye(3)),
            Err(OperatorError::DimensionMismatch { operation: "right_divide", .. })
        ));
        let singular = Operator::<f64>::from_matrix(array![[1.0, 2.0], [2.0, 4.0]]);
        assert!(matches!(
            right_divide(eye(2), singular),
            Err(OperatorError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn divide_by_zero_rejected() {
        assert_eq!(
            divide_by_scalar(eye(2), 0.0).unwrap_err(),
            OperatorError::SingularCoefficient
        );
        let half = divide_by_scalar(eye(2), 2.0).unwrap();
        assert_eq!(half.get(1, 1).unwrap(), 0.5);
    }
}
