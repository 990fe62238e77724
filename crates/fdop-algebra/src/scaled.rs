//! `coeff * op`.

use crate::operator::Operator;
use crate::protocol::LinearOperator;
use fdop_core::{NormKind, OperatorError, Scalar, ScalarValue, Shape};
use ndarray::Array2;

/// An operator multiplied by a (possibly time-dependent) scalar.
#[derive(Clone, Debug)]
pub struct ScaledOperator<T: Scalar> {
    coeff: ScalarValue<T>,
    op: Box<Operator<T>>,
}

fn scale_in_place<T: Scalar>(v: &mut [T], c: T) {
    for vi in v.iter_mut() {
        *vi *= c;
    }
}

impl<T: Scalar> ScaledOperator<T> {
    /// Wrap `op` with coefficient `coeff`.
    pub fn new(coeff: impl Into<ScalarValue<T>>, op: Operator<T>) -> Self {
        Self {
            coeff: coeff.into(),
            op: Box::new(op),
        }
    }

    /// The scalar coefficient.
    pub fn coefficient(&self) -> &ScalarValue<T> {
        &self.coeff
    }

    /// The wrapped operator.
    pub fn inner(&self) -> &Operator<T> {
        &self.op
    }

    pub(crate) fn into_parts(self) -> (ScalarValue<T>, Operator<T>) {
        (self.coeff, *self.op)
    }

    fn inverse_coefficient(&self) -> Result<T, OperatorError> {
        if self.coeff.is_zero() {
            return Err(OperatorError::SingularCoefficient);
        }
        Ok(T::one() / self.coeff.value())
    }
}

impl<T: Scalar> LinearOperator<T> for ScaledOperator<T> {
    fn shape(&self) -> Shape {
        self.op.shape()
    }

    fn apply_into(&mut self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        self.op.apply_into(x, y)?;
        scale_in_place(y, self.coeff.value());
        Ok(())
    }

    fn apply(&self, x: &[T]) -> Result<Vec<T>, OperatorError> {
        let mut y = self.op.apply(x)?;
        scale_in_place(&mut y, self.coeff.value());
        Ok(y)
    }

    fn solve_into(&mut self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        let inv = self.inverse_coefficient()?;
        self.op.solve_into(b, x)?;
        scale_in_place(x, inv);
        Ok(())
    }

    fn solve(&self, b: &[T]) -> Result<Vec<T>, OperatorError> {
        let inv = self.inverse_coefficient()?;
        let mut x = self.op.solve(b)?;
        scale_in_place(&mut x, inv);
        Ok(x)
    }

    fn norm(&self, kind: NormKind) -> Result<T, OperatorError> {
        Ok(self.coeff.value().abs() * self.op.norm(kind)?)
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        Ok(self.coeff.value() * self.op.get(row, col)?)
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        let c = self.coeff.value();
        let mut m = self.op.to_matrix()?;
        m.mapv_inplace(|v| v * c);
        Ok(m)
    }

    fn factorize(&self) -> Result<Operator<T>, OperatorError> {
        Ok(Operator::Scaled(Self {
            coeff: self.coeff.clone(),
            op: Box::new(self.op.factorize()?),
        }))
    }

    fn children(&self) -> &[Operator<T>] {
        std::slice::from_ref(&*self.op)
    }

    fn children_mut(&mut self) -> &mut [Operator<T>] {
        std::slice::from_mut(&mut *self.op)
    }

    fn is_constant(&self) -> bool {
        self.coeff.is_constant() && self.op.is_constant()
    }

    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        self.coeff.update(u, p, t);
        self.op.update_coefficients(u, p, t);
    }
}
