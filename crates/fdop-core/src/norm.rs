//! Operator and vector norms.

use crate::scalar::Scalar;
use ndarray::Array2;

/// Maximum power iterations for the spectral norm.
const POWER_ITERATION_CAP: usize = 500;

/// Iterations run before the spectral norm may report convergence.
const POWER_ITERATION_MIN: usize = 4;

/// Relative convergence tolerance for the spectral norm.
const POWER_ITERATION_TOL: f64 = 1e-12;

/// Which operator norm to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NormKind {
    /// Maximum absolute column sum.
    One,
    /// Largest singular value, estimated by power iteration on `AᵀA`.
    #[default]
    Two,
    /// Maximum absolute row sum.
    Inf,
    /// Square root of the sum of squared entries.
    Frobenius,
}

/// Norm of a dense matrix.
pub fn matrix_norm<T: Scalar>(a: &Array2<T>, kind: NormKind) -> T {
    match kind {
        NormKind::One => a
            .columns()
            .into_iter()
            .map(|c| c.iter().fold(T::zero(), |acc, v| acc + v.abs()))
            .fold(T::zero(), T::max),
        NormKind::Inf => a
            .rows()
            .into_iter()
            .map(|r| r.iter().fold(T::zero(), |acc, v| acc + v.abs()))
            .fold(T::zero(), T::max),
        NormKind::Frobenius => a.iter().fold(T::zero(), |acc, v| acc + *v * *v).sqrt(),
        NormKind::Two => spectral_norm(a),
    }
}

/// Euclidean norm of a vector.
pub fn vector_norm<T: Scalar>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, v| acc + *v * *v).sqrt()
}

fn spectral_norm<T: Scalar>(a: &Array2<T>) -> T {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return T::zero();
    }
    let ata = a.t().dot(a);

    // ‖A e_j‖ never exceeds ‖A‖₂, so the largest column norm is a floor.
    let (widest, floor) = a
        .columns()
        .into_iter()
        .map(|c| c.iter().fold(T::zero(), |acc, x| acc + *x * *x).sqrt())
        .enumerate()
        .fold((0, T::zero()), |best, (j, n)| if n > best.1 { (j, n) } else { best });

    // A single start can sit on a non-dominant eigenvector of AᵀA, so run
    // from two unrelated starts and keep the larger estimate.
    let skewed = ndarray::Array1::from_iter((0..cols).map(|i| T::one() + T::cast(i as f64 * 0.1)));
    let column = ata.column(widest).to_owned();
    let estimate = power_iteration(&ata, skewed).max(power_iteration(&ata, column));
    estimate.sqrt().max(floor)
}

/// Dominant eigenvalue of the symmetric positive semidefinite `ata`.
fn power_iteration<T: Scalar>(ata: &Array2<T>, mut v: ndarray::Array1<T>) -> T {
    let tol = T::cast(POWER_ITERATION_TOL);
    let n0 = v.iter().fold(T::zero(), |acc, x| acc + *x * *x).sqrt();
    if n0 == T::zero() {
        return T::zero();
    }
    v.mapv_inplace(|x| x / n0);

    let mut lambda = T::zero();
    for iter in 0..POWER_ITERATION_CAP {
        let w = ata.dot(&v);
        let wn = w.iter().fold(T::zero(), |acc, x| acc + *x * *x).sqrt();
        if wn == T::zero() {
            return T::zero();
        }
        let converged = iter >= POWER_ITERATION_MIN && (wn - lambda).abs() <= tol * wn;
        lambda = wn;
        v = w.mapv(|x| x / wn);
        if converged {
            break;
        }
    }
    lambda
}
