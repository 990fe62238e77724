//! Dense linear-algebra kernels used when an operator is materialized.
//!
//! Partial-pivoting LU for solves and factorizations, integer powers, and
//! the matrix exponential by scaling and squaring.

use crate::error::{check_len, OperatorError};
use crate::norm::{matrix_norm, NormKind};
use crate::scalar::Scalar;
use ndarray::Array2;

/// Taylor terms used by [`expm`] after scaling.
const EXPM_TAYLOR_TERMS: usize = 18;

/// `expm` scales the matrix until its 1-norm is at most this.
const EXPM_SCALE_TARGET: f64 = 0.5;

/// The `j`-th standard basis vector of length `len`.
pub fn unit_vector<T: Scalar>(len: usize, j: usize) -> Vec<T> {
    let mut e = vec![T::zero(); len];
    if j < len {
        e[j] = T::one();
    }
    e
}

/// `y = A x` for a dense matrix.
pub fn matvec_into<T: Scalar>(a: &Array2<T>, x: &[T], y: &mut [T]) -> Result<(), OperatorError> {
    let (rows, cols) = a.dim();
    check_len("apply", cols, x.len())?;
    check_len("apply", rows, y.len())?;
    for (i, row) in a.rows().into_iter().enumerate() {
        y[i] = row
            .iter()
            .zip(x)
            .fold(T::zero(), |acc, (aij, xj)| acc + *aij * *xj);
    }
    Ok(())
}

fn require_square<T>(operation: &'static str, a: &Array2<T>) -> Result<usize, OperatorError> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(OperatorError::DimensionMismatch {
            operation,
            expected: (rows, rows),
            found: (rows, cols),
        });
    }
    Ok(rows)
}

/// LU factors of a square matrix with partial (row) pivoting: `PA = LU`.
///
/// `L` is unit lower triangular and stored below the diagonal of `lu`;
/// `U` occupies the diagonal and above.
#[derive(Clone, Debug)]
pub struct LuFactors<T> {
    lu: Array2<T>,
    /// Row `i` of `PA` is row `pivots[i]` of `A`.
    pivots: Vec<usize>,
}

impl<T: Scalar> LuFactors<T> {
    /// Factorize a square matrix.
    ///
    /// Returns [`OperatorError::SingularMatrix`] when the best pivot of a
    /// column is at most `‖A‖₁ · ε`, i.e. zero to working precision.
    pub fn new(a: &Array2<T>) -> Result<Self, OperatorError> {
        let n = require_square("factorize", a)?;
        let tiny = matrix_norm(a, NormKind::One) * T::epsilon();
        let mut lu = a.clone();
        let mut pivots: Vec<usize> = (0..n).collect();

        for k in 0..n {
            let mut p = k;
            let mut best = lu[[k, k]].abs();
            for i in (k + 1)..n {
                let v = lu[[i, k]].abs();
                if v > best {
                    best = v;
                    p = i;
                }
            }
            if best <= tiny {
                return Err(OperatorError::SingularMatrix { pivot: k });
            }
            if p != k {
                for j in 0..n {
                    let tmp = lu[[k, j]];
                    lu[[k, j]] = lu[[p, j]];
                    lu[[p, j]] = tmp;
                }
                pivots.swap(k, p);
            }

            let pivot = lu[[k, k]];
            for i in (k + 1)..n {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                for j in (k + 1)..n {
                    let ukj = lu[[k, j]];
                    lu[[i, j]] -= factor * ukj;
                }
            }
        }

        Ok(Self { lu, pivots })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.pivots.len()
    }

    /// Solve `A x = b` using the stored factors.
    pub fn solve_into(&self, b: &[T], x: &mut [T]) -> Result<(), OperatorError> {
        let n = self.dim();
        check_len("solve", n, b.len())?;
        check_len("solve", n, x.len())?;

        for (xi, &p) in x.iter_mut().zip(&self.pivots) {
            *xi = b[p];
        }
        // Forward substitution with unit-diagonal L.
        for i in 0..n {
            let mut acc = x[i];
            for j in 0..i {
                acc -= self.lu[[i, j]] * x[j];
            }
            x[i] = acc;
        }
        // Back substitution with U.
        for i in (0..n).rev() {
            let mut acc = x[i];
            for j in (i + 1)..n {
                acc -= self.lu[[i, j]] * x[j];
            }
            x[i] = acc / self.lu[[i, i]];
        }
        Ok(())
    }

    /// Solve `A x = b`, allocating the result.
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, OperatorError> {
        let mut x = vec![T::zero(); self.dim()];
        self.solve_into(b, &mut x)?;
        Ok(x)
    }
}

/// `A^n` for a square matrix by binary exponentiation (`A^0 = I`).
pub fn powi<T: Scalar>(a: &Array2<T>, n: u32) -> Result<Array2<T>, OperatorError> {
    let dim = require_square("pow", a)?;
    let mut result = Array2::eye(dim);
    let mut base = a.clone();
    let mut e = n;
    while e > 0 {
        if e & 1 == 1 {
            result = result.dot(&base);
        }
        e >>= 1;
        if e > 0 {
            base = base.dot(&base);
        }
    }
    Ok(result)
}

/// Matrix exponential `e^A` by scaling and squaring with a truncated Taylor
/// series.
pub fn expm<T: Scalar>(a: &Array2<T>) -> Result<Array2<T>, OperatorError> {
    let dim = require_square("exp", a)?;
    let norm = matrix_norm(a, NormKind::One);
    let target = T::cast(EXPM_SCALE_TARGET);

    let mut squarings = 0u32;
    let mut scale = T::one();
    while norm * scale > target {
        scale = scale / T::cast(2.0);
        squarings += 1;
    }
    let scaled = a.mapv(|v| v * scale);

    let mut result: Array2<T> = Array2::eye(dim);
    let mut term: Array2<T> = Array2::eye(dim);
    for k in 1..=EXPM_TAYLOR_TERMS {
        term = term.dot(&scaled).mapv(|v| v / T::cast(k as f64));
        result = result + &term;
    }
    for _ in 0..squarings {
        result = result.dot(&result);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn unit_vector_places_one() {
        let e: Vec<f64> = unit_vector(4, 2);
        assert_eq!(e, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn matvec_matches_manual_product() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let mut y = [0.0; 2];
        matvec_into(&a, &[1.0, 0.0, -1.0], &mut y).unwrap();
        assert_eq!(y, [-2.0, -2.0]);
    }

    #[test]
    fn lu_solves_with_pivoting() {
        // Zero in the leading position forces a row swap.
        let a = array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [2.0, 0.0, 3.0]];
        let lu = LuFactors::new(&a).unwrap();
        let x_true = [1.0, -2.0, 0.5];
        let mut b = [0.0; 3];
        matvec_into(&a, &x_true, &mut b).unwrap();
        let x = lu.solve(&b).unwrap();
        for (xi, ti) in x.iter().zip(&x_true) {
            assert!(close(*xi, *ti), "{xi} vs {ti}");
        }
    }

    #[test]
    fn lu_rejects_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(matches!(
            LuFactors::new(&a),
            Err(OperatorError::SingularMatrix { pivot: 1 })
        ));
    }

    #[test]
    fn lu_rejects_numerically_singular() {
        // Row 1 is row 0 times 3 only up to rounding, so elimination leaves
        // a residue of order eps rather than an exact zero.
        let a = array![[0.1, 0.7], [0.3, 2.1]];
        assert!(matches!(
            LuFactors::new(&a),
            Err(OperatorError::SingularMatrix { pivot: 1 })
        ));
    }

    #[test]
    fn lu_accepts_small_but_well_conditioned() {
        let a = array![[1e-200, 0.0], [0.0, 2e-200]];
        let x = LuFactors::new(&a).unwrap().solve(&[1e-200, 1e-200]).unwrap();
        assert!(close(x[0], 1.0) && close(x[1], 0.5));
    }

    #[test]
    fn lu_rejects_rectangular() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            LuFactors::new(&a),
            Err(OperatorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn powi_zero_is_identity() {
        let a = array![[2.0, 1.0], [0.0, 3.0]];
        assert_eq!(powi(&a, 0).unwrap(), Array2::eye(2));
    }

    #[test]
    fn powi_cubes() {
        let a = array![[1.0, 1.0], [0.0, 1.0]];
        let a3 = powi(&a, 3).unwrap();
        assert_eq!(a3, array![[1.0, 3.0], [0.0, 1.0]]);
    }

    #[test]
    fn expm_of_zero_is_identity() {
        let z = Array2::<f64>::zeros((3, 3));
        assert_eq!(expm(&z).unwrap(), Array2::eye(3));
    }

    #[test]
    fn expm_of_diagonal() {
        let a = array![[1.0, 0.0], [0.0, -2.0]];
        let e = expm(&a).unwrap();
        assert!(close(e[[0, 0]], 1.0f64.exp()));
        assert!(close(e[[1, 1]], (-2.0f64).exp()));
        assert!(close(e[[0, 1]], 0.0));
    }

    #[test]
    fn expm_of_nilpotent() {
        // exp([[0, t], [0, 0]]) = [[1, t], [0, 1]]
        let a = array![[0.0, 3.0], [0.0, 0.0]];
        let e = expm(&a).unwrap();
        assert!(close(e[[0, 1]], 3.0));
        assert!(close(e[[0, 0]], 1.0));
    }
}
