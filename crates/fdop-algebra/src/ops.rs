//! Arithmetic overloads for [`Operator`].
//!
//! Every overload delegates to the named builder in [`crate::build`].
//! Overloads that check shapes return `Result<Operator<T>, OperatorError>`.

use crate::build;
use crate::operator::Operator;
use fdop_core::{OperatorError, Scalar, ScalarValue};
use ndarray::Array2;
use std::ops::{Add, Div, Mul, Neg, Sub};

impl<T: Scalar> Neg for Operator<T> {
    type Output = Operator<T>;

    fn neg(self) -> Self::Output {
        build::negate(self)
    }
}

impl<T: Scalar> Add for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn add(self, rhs: Operator<T>) -> Self::Output {
        build::add(self, rhs)
    }
}

impl<T: Scalar> Sub for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn sub(self, rhs: Operator<T>) -> Self::Output {
        build::sub(self, rhs)
    }
}

/// `a * b` is the composition `a ∘ b`.
impl<T: Scalar> Mul for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn mul(self, rhs: Operator<T>) -> Self::Output {
        build::multiply(self, rhs)
    }
}

impl<T: Scalar> Mul<ScalarValue<T>> for Operator<T> {
    type Output = Operator<T>;

    fn mul(self, rhs: ScalarValue<T>) -> Self::Output {
        build::scale(self, rhs)
    }
}

/// `a / b` is the right division `A B⁻¹`, materialized.
impl<T: Scalar> Div for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn div(self, rhs: Operator<T>) -> Self::Output {
        build::right_divide(self, rhs)
    }
}

/// `a * m` composes with the dense matrix `m`, applied first.
impl<T: Scalar> Mul<Array2<T>> for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn mul(self, rhs: Array2<T>) -> Self::Output {
        build::multiply(self, Operator::from_matrix(rhs))
    }
}

impl<T: Scalar> Add<Array2<T>> for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn add(self, rhs: Array2<T>) -> Self::Output {
        build::add(self, Operator::from_matrix(rhs))
    }
}

impl<T: Scalar> Sub<Array2<T>> for Operator<T> {
    type Output = Result<Operator<T>, OperatorError>;

    fn sub(self, rhs: Array2<T>) -> Self::Output {
        build::sub(self, Operator::from_matrix(rhs))
    }
}

macro_rules! scalar_ops {
    ($($t:ty),*) => {$(
        impl Mul<$t> for Operator<$t> {
            type Output = Operator<$t>;

            fn mul(self, rhs: $t) -> Self::Output {
                build::scale(self, rhs)
            }
        }

        impl Mul<Operator<$t>> for $t {
            type Output = Operator<$t>;

            fn mul(self, rhs: Operator<$t>) -> Self::Output {
                build::scale(rhs, self)
            }
        }

        impl Mul<Operator<$t>> for ScalarValue<$t> {
            type Output = Operator<$t>;

            fn mul(self, rhs: Operator<$t>) -> Self::Output {
                build::scale(rhs, self)
            }
        }

        impl Mul<Operator<$t>> for Array2<$t> {
            type Output = Result<Operator<$t>, OperatorError>;

            fn mul(self, rhs: Operator<$t>) -> Self::Output {
                build::multiply(Operator::from_matrix(self), rhs)
            }
        }

        impl Div<$t> for Operator<$t> {
            type Output = Result<Operator<$t>, OperatorError>;

            fn div(self, rhs: $t) -> Self::Output {
                build::divide_by_scalar(self, rhs)
            }
        }
    )*};
}

scalar_ops!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LinearOperator;
    use ndarray::array;

    fn a() -> Operator<f64> {
        Operator::from_matrix(array![[1.0, 2.0], [3.0, 4.0]])
    }

    #[test]
    fn scalar_multiplication_both_sides() {
        let left = (2.0 * a()).to_matrix().unwrap();
        let right = (a() * 2.0).to_matrix().unwrap();
        assert_eq!(left, right);
        assert_eq!(left[[1, 1]], 8.0);
    }

    #[test]
    fn negation_and_subtraction() {
        let n = (-a()).apply(&[1.0, 0.0]).unwrap();
        assert_eq!(n, vec![-1.0, -3.0]);
        let zero = (a() - a()).unwrap().to_matrix().unwrap();
        assert_eq!(zero, Array2::zeros((2, 2)));
    }

    #[test]
    fn product_is_composition() {
        let p = (a() * a()).unwrap();
        assert_eq!(p.to_matrix().unwrap(), array![[7.0, 10.0], [15.0, 22.0]]);
    }

    #[test]
    fn add_dense_matrix() {
        let s = (a() + Array2::eye(2)).unwrap();
        assert_eq!(s.get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn division_by_scalar() {
        let h = (a() / 2.0).unwrap();
        assert_eq!(h.get(1, 0).unwrap(), 1.5);
        assert!((a() / 0.0).is_err());
    }

    #[test]
    fn multiply_by_dense_matrix_on_either_side() {
        let m: Array2<f64> = array![[0.0, 1.0, 2.0], [1.0, 0.0, -1.0]];
        let right = (a() * m.clone()).unwrap();
        assert_eq!(right.shape(), (2, 3));
        assert_eq!(right.to_matrix().unwrap(), array![[2.0, 1.0, 0.0], [4.0, 3.0, 2.0]]);

        let left = (m.t().to_owned() * a()).unwrap();
        assert_eq!(left.shape(), (3, 2));
        assert_eq!(left.to_matrix().unwrap(), m.t().dot(&array![[1.0, 2.0], [3.0, 4.0]]));

        let tall = Array2::<f64>::zeros((3, 3));
        assert!((a() * tall).is_err());
    }

    #[test]
    fn operator_division_is_right_division() {
        let q = (a() / a()).unwrap().to_matrix().unwrap();
        for ((i, j), v) in q.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((v - expected).abs() < 1e-12, "[{i}, {j}] = {v}");
        }
    }

    #[test]
    fn single_precision_overloads() {
        let b = Operator::from_matrix(array![[1.0f32, 0.0], [0.0, 1.0]]);
        let m = (3.0f32 * b).to_matrix().unwrap();
        assert_eq!(m[[0, 0]], 3.0f32);
    }

    #[test]
    fn scalar_value_coefficient() {
        let c = ScalarValue::with_rule(1.0, |_v: f64, _u: &[f64], _p: &[f64], t: f64| t);
        let mut op = c * a();
        assert!(!op.is_constant());
        op.update_coefficients(&[], &[], 2.0);
        assert_eq!(op.get(0, 1).unwrap(), 4.0);
    }
}
