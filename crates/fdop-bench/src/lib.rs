//! Benchmark profiles for fdop.
//!
//! Pre-built operators shared by the criterion benches:
//!
//! - [`laplacian_profile`]: `D2 ∘ Q` with Dirichlet-zero padding
//! - [`advection_diffusion_profile`]: `ν·D2∘Q - a·D1∘Q` with periodic padding,
//!   exercising every composite node kind
//! - [`smooth_input`]: deterministic sample data

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use fdop_algebra::{compose, scale, sub, Operator};
use fdop_core::OperatorError;
use fdop_stencil::{BoundaryPadding, DerivativeOperator};

/// Second-derivative operator on `n` interior points of `[0, 1]` with zero
/// Dirichlet ghosts, fourth-order accurate.
pub fn laplacian_profile(n: usize) -> Result<Operator<f64>, OperatorError> {
    let dx = 1.0 / (n as f64 + 1.0);
    let d2 = DerivativeOperator::centered(2, 4, dx, n)?;
    compose(Operator::leaf(d2), Operator::leaf(BoundaryPadding::dirichlet0(n)))
}

/// `nu * D2∘Q - speed * D1∘Q` on a periodic grid of `n` points.
pub fn advection_diffusion_profile(
    n: usize,
    nu: f64,
    speed: f64,
) -> Result<Operator<f64>, OperatorError> {
    let dx = 1.0 / n as f64;
    let q = || Operator::leaf(BoundaryPadding::periodic(n));
    let d2 = compose(Operator::leaf(DerivativeOperator::centered(2, 2, dx, n)?), q())?;
    let d1 = compose(Operator::leaf(DerivativeOperator::centered(1, 2, dx, n)?), q())?;
    sub(scale(d2, nu), scale(d1, speed))
}

/// `sin(2πx)` sampled at `n` points, plus a small deterministic ripple.
pub fn smooth_input(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            (std::f64::consts::TAU * x).sin() + 0.01 * ((i * 7919) % 13) as f64
        })
        .collect()
}
