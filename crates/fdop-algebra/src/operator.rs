//! The [`Operator`] expression tree.

use crate::combination::OperatorCombination;
use crate::composition::OperatorComposition;
use crate::protocol::LinearOperator;
use crate::scaled::ScaledOperator;
use fdop_core::{
    expm, matrix_norm, powi, ArrayOperator, BandedMatrix, LeafOperator, NormKind, OperatorError,
    Scalar, Shape, SparseMatrix,
};
use ndarray::Array2;
use tracing::trace;

/// A lazily evaluated linear operator.
///
/// Leaves are open (any [`LeafOperator`]); composite nodes are the closed
/// set of scaled, summed and composed operators. Trees are built bottom-up
/// through [`crate::build`] or the arithmetic overloads and never share
/// nodes.
///
/// ```
/// use fdop_algebra::{LinearOperator, Operator};
/// use ndarray::array;
///
/// let a = Operator::from_matrix(array![[1.0f64, 2.0], [3.0, 4.0]]);
/// let b = Operator::from_matrix(array![[0.0f64, 1.0], [1.0, 0.0]]);
/// let sum = (a + 2.0 * b).unwrap();
/// assert_eq!(sum.apply(&[1.0, 0.0]).unwrap(), vec![1.0, 5.0]);
/// ```
#[derive(Clone, Debug)]
pub enum Operator<T: Scalar> {
    /// A primitive operator.
    Leaf(Box<dyn LeafOperator<T>>),
    /// `coeff * op`.
    Scaled(ScaledOperator<T>),
    /// `op[0] + ... + op[k]`.
    Combination(OperatorCombination<T>),
    /// `ops[last] ∘ ... ∘ ops[0]`.
    Composition(OperatorComposition<T>),
}

impl<T: Scalar> Operator<T> {
    /// Wrap a primitive operator.
    pub fn leaf<L: LeafOperator<T> + 'static>(leaf: L) -> Self {
        Operator::Leaf(Box::new(leaf))
    }

    /// Wrap a dense matrix as a constant [`ArrayOperator`] leaf.
    pub fn from_matrix(matrix: Array2<T>) -> Self {
        Self::leaf(ArrayOperator::new(matrix))
    }

    /// The leaf, if this node is one.
    pub fn as_leaf(&self) -> Option<&dyn LeafOperator<T>> {
        match self {
            Operator::Leaf(leaf) => Some(leaf.as_ref()),
            _ => None,
        }
    }

    /// Materialize into compressed sparse row form.
    pub fn to_sparse(&self) -> Result<SparseMatrix<T>, OperatorError> {
        Ok(SparseMatrix::from_dense(&self.to_matrix()?))
    }

    /// Materialize into banded form.
    ///
    /// Leaves that know their bandwidths skip the detection scan.
    pub fn to_banded(&self) -> Result<BandedMatrix<T>, OperatorError> {
        let m = self.to_matrix()?;
        match self.as_leaf().and_then(|leaf| leaf.bandwidths()) {
            Some((lower, upper)) => Ok(BandedMatrix::from_dense_with_bands(&m, lower, upper)),
            None => Ok(BandedMatrix::from_dense(&m)),
        }
    }

    /// Dense matrix exponential, as a constant array leaf.
    pub fn expm(&self) -> Result<Operator<T>, OperatorError> {
        Ok(Self::from_matrix(expm(&self.to_matrix()?)?))
    }

    /// Dense integer power, as a constant array leaf.
    pub fn powi(&self, n: u32) -> Result<Operator<T>, OperatorError> {
        Ok(Self::from_matrix(powi(&self.to_matrix()?, n)?))
    }

    /// Update all coefficients from `(u, p, t)` and materialize.
    pub fn evaluate(&mut self, u: &[T], p: &[T], t: T) -> Result<Array2<T>, OperatorError> {
        crate::coordinator::evaluate(self, u, p, t)
    }
}

impl<T: Scalar> LinearOperator<T> for Operator<T> {
    fn shape(&self) -> Shape {
        match self {
            Operator::Leaf(leaf) => leaf.shape(),
            Operator::Scaled(op) => op.shape(),
            Operator::Combination(op) => op.shape(),
            Operator::Composition(op) => op.shape(),
        }
    }

    fn apply_into(&mut self, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
        match self {
            Operator::Leaf(leaf) => leaf.apply_into(x, y),
            Operator::Scaled(op) => op.apply_into(x, y),
            Operator::Combination(op) => op.apply_into(x, y),
            Operator::Composition(op) => op.apply_into(x, y),
        }
    }

    fn apply(&self, x: &[T]) -> Result<Vec<T>, OperatorError> {
        match self {
            Operator::Leaf(leaf) => {
                let mut y = vec![T::zero(); leaf.shape().0];
                leaf.apply_into(x, &mut y)?;
                Ok(y)
            }
            Operator::Scaled(op) => op.apply(x),
            Operator::Combination(op) => op.apply(x),
            Operator::Composition(op) => op.apply(x),
        }
    }

    fn solve_into(&mut self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        match self {
            Operator::Leaf(leaf) => leaf.solve_into(b, x),
            Operator::Scaled(op) => op.solve_into(b, x),
            Operator::Combination(op) => op.solve_into(b, x),
            Operator::Composition(op) => op.solve_into(b, x),
        }
    }

    fn solve(&self, b: &[T]) -> Result<Vec<T>, OperatorError> {
        match self {
            Operator::Leaf(leaf) => {
                let mut x = vec![T::zero(); leaf.shape().1];
                leaf.solve_into(b, &mut x)?;
                Ok(x)
            }
            Operator::Scaled(op) => op.solve(b),
            Operator::Combination(op) => op.solve(b),
            Operator::Composition(op) => op.solve(b),
        }
    }

    fn norm(&self, kind: NormKind) -> Result<T, OperatorError> {
        match self {
            Operator::Leaf(leaf) => Ok(matrix_norm(&leaf.to_matrix()?, kind)),
            Operator::Scaled(op) => op.norm(kind),
            Operator::Combination(op) => op.norm(kind),
            Operator::Composition(op) => op.norm(kind),
        }
    }

    fn get(&self, row: usize, col: usize) -> Result<T, OperatorError> {
        match self {
            Operator::Leaf(leaf) => leaf.get(row, col),
            Operator::Scaled(op) => op.get(row, col),
            Operator::Combination(op) => op.get(row, col),
            Operator::Composition(op) => op.get(row, col),
        }
    }

    fn to_matrix(&self) -> Result<Array2<T>, OperatorError> {
        match self {
            Operator::Leaf(leaf) => leaf.to_matrix(),
            Operator::Scaled(op) => op.to_matrix(),
            Operator::Combination(op) => op.to_matrix(),
            Operator::Composition(op) => op.to_matrix(),
        }
    }

    fn factorize(&self) -> Result<Operator<T>, OperatorError> {
        match self {
            Operator::Leaf(leaf) => leaf.factorize().map(Operator::Leaf),
            Operator::Scaled(op) => op.factorize(),
            Operator::Combination(op) => op.factorize(),
            Operator::Composition(op) => op.factorize(),
        }
    }

    fn children(&self) -> &[Operator<T>] {
        match self {
            Operator::Leaf(_) => &[],
            Operator::Scaled(op) => op.children(),
            Operator::Combination(op) => op.children(),
            Operator::Composition(op) => op.children(),
        }
    }

    fn children_mut(&mut self) -> &mut [Operator<T>] {
        match self {
            Operator::Leaf(_) => &mut [],
            Operator::Scaled(op) => op.children_mut(),
            Operator::Combination(op) => op.children_mut(),
            Operator::Composition(op) => op.children_mut(),
        }
    }

    fn is_constant(&self) -> bool {
        match self {
            Operator::Leaf(leaf) => leaf.is_constant(),
            Operator::Scaled(op) => op.is_constant(),
            Operator::Combination(op) => op.is_constant(),
            Operator::Composition(op) => op.is_constant(),
        }
    }

    fn update_coefficients(&mut self, u: &[T], p: &[T], t: T) {
        match self {
            Operator::Leaf(leaf) => {
                if !leaf.is_constant() {
                    trace!(leaf = leaf.name(), "updating leaf coefficients");
                }
                leaf.update_coefficients(u, p, t);
            }
            Operator::Scaled(op) => op.update_coefficients(u, p, t),
            Operator::Combination(op) => op.update_coefficients(u, p, t),
            Operator::Composition(op) => op.update_coefficients(u, p, t),
        }
    }
}

impl<T: Scalar> From<ArrayOperator<T>> for Operator<T> {
    fn from(leaf: ArrayOperator<T>) -> Self {
        Self::leaf(leaf)
    }
}

impl<T: Scalar> From<Array2<T>> for Operator<T> {
    fn from(matrix: Array2<T>) -> Self {
        Self::from_matrix(matrix)
    }
}

impl<T: Scalar> From<ScaledOperator<T>> for Operator<T> {
    fn from(op: ScaledOperator<T>) -> Self {
        Operator::Scaled(op)
    }
}

impl<T: Scalar> From<OperatorCombination<T>> for Operator<T> {
    fn from(op: OperatorCombination<T>) -> Self {
        Operator::Combination(op)
    }
}

impl<T: Scalar> From<OperatorComposition<T>> for Operator<T> {
    fn from(op: OperatorComposition<T>) -> Self {
        Operator::Composition(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn leaf_apply_and_solve_allocate() {
        let a = Operator::from_matrix(array![[2.0, 0.0], [0.0, 4.0]]);
        assert_eq!(a.apply(&[1.0, 1.0]).unwrap(), vec![2.0, 4.0]);
        assert_eq!(a.solve(&[2.0, 4.0]).unwrap(), vec![1.0, 1.0]);
        assert!(a.children().is_empty());
    }

    /// Diagonal leaf that declares wider bands than its entries need.
    #[derive(Clone, Debug)]
    struct DeclaredBands(Array2<f64>);

    impl LeafOperator<f64> for DeclaredBands {
        fn name(&self) -> &str {
            "DeclaredBands"
        }

        fn shape(&self) -> Shape {
            self.0.dim()
        }

        fn apply_into(&self, x: &[f64], y: &mut [f64]) -> Result<(), OperatorError> {
            fdop_core::matvec_into(&self.0, x, y)
        }

        fn bandwidths(&self) -> Option<(usize, usize)> {
            Some((1, 2))
        }

        fn box_clone(&self) -> Box<dyn LeafOperator<f64>> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn to_banded_uses_leaf_bandwidths() {
        let op = Operator::leaf(DeclaredBands(Array2::eye(4)));
        let b = op.to_banded().unwrap();
        assert_eq!(b.bandwidths(), (1, 2));
        assert_eq!(b.to_dense(), Array2::eye(4));
        // Scanning the same entries finds only the diagonal.
        let scanned = Operator::from_matrix(Array2::<f64>::eye(4)).to_banded().unwrap();
        assert_eq!(scanned.bandwidths(), (0, 0));
    }

    #[test]
    fn to_banded_detects_bandwidths() {
        let a = Operator::from_matrix(array![[1.0, 2.0, 0.0], [0.0, 1.0, 2.0], [0.0, 0.0, 1.0]]);
        let b = a.to_banded().unwrap();
        assert_eq!(b.bandwidths(), (0, 1));
        assert_eq!(b.to_dense(), a.to_matrix().unwrap());
        let s = a.to_sparse().unwrap();
        assert_eq!(s.nnz(), 5);
    }

    #[test]
    fn expm_of_zero_is_identity() {
        let z = Operator::from_matrix(Array2::<f64>::zeros((3, 3)));
        assert_eq!(z.expm().unwrap().to_matrix().unwrap(), Array2::eye(3));
    }

    #[test]
    fn powi_squares() {
        let a = Operator::from_matrix(array![[1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(a.powi(3).unwrap().to_matrix().unwrap(), array![[1.0, 3.0], [0.0, 1.0]]);
    }

    #[test]
    fn non_square_expm_rejected() {
        let a = Operator::from_matrix(Array2::<f64>::zeros((2, 3)));
        assert!(matches!(a.expm(), Err(OperatorError::DimensionMismatch { .. })));
    }
}
