//! Test utilities and mock leaves for fdop development.
//!
//! - seeded random inputs ([`random_vector`], [`random_matrix`])
//! - tolerance assertions ([`assert_close`], [`assert_slices_close`],
//!   [`assert_matrices_close`])
//! - leaf fixtures in [`fixtures`]

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{time_fill_rule, time_filled_leaf, CountingLeaf};

use fdop_core::Scalar;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic vector with entries uniform in `[-1, 1)`.
pub fn random_vector<T: Scalar>(len: usize, seed: u64) -> Vec<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| T::cast(rng.random_range(-1.0..1.0)))
        .collect()
}

/// Deterministic matrix with entries uniform in `[-1, 1)`.
pub fn random_matrix<T: Scalar>(rows: usize, cols: usize, seed: u64) -> Array2<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_simple_fn((rows, cols), || T::cast(rng.random_range(-1.0..1.0)))
}

/// Deterministic, strictly diagonally dominant (hence non-singular) matrix.
pub fn random_nonsingular<T: Scalar>(dim: usize, seed: u64) -> Array2<T> {
    let mut a = random_matrix::<T>(dim, dim, seed);
    for i in 0..dim {
        a[[i, i]] += T::cast(dim as f64 + 1.0);
    }
    a
}

/// Panic unless `|a - b| <= tol * max(1, |a|, |b|)`.
#[track_caller]
pub fn assert_close<T: Scalar>(a: T, b: T, tol: f64) {
    let scale = T::one().max(a.abs()).max(b.abs());
    assert!(
        (a - b).abs() <= T::cast(tol) * scale,
        "values differ: {a} vs {b} (tol {tol})"
    );
}

/// Element-wise [`assert_close`] over equal-length slices.
#[track_caller]
pub fn assert_slices_close<T: Scalar>(a: &[T], b: &[T], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let scale = T::one().max(x.abs()).max(y.abs());
        assert!(
            (*x - *y).abs() <= T::cast(tol) * scale,
            "index {i}: {x} vs {y} (tol {tol})"
        );
    }
}

/// Element-wise [`assert_close`] over equal-shape matrices.
#[track_caller]
pub fn assert_matrices_close<T: Scalar>(a: &Array2<T>, b: &Array2<T>, tol: f64) {
    assert_eq!(a.dim(), b.dim(), "shape mismatch");
    for ((idx, x), y) in a.indexed_iter().zip(b.iter()) {
        let scale = T::one().max(x.abs()).max(y.abs());
        assert!(
            (*x - *y).abs() <= T::cast(tol) * scale,
            "entry {idx:?}: {x} vs {y} (tol {tol})"
        );
    }
}
