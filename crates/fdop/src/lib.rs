//! fdop: lazily-composable finite-difference linear operators.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! fdop sub-crates. For most users, adding `fdop` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use fdop::prelude::*;
//!
//! // -u'' on 9 interior points of [0, 1] with zero Dirichlet ghosts.
//! let n = 9;
//! let dx = 0.1f64;
//! let d2 = DerivativeOperator::centered(2, 2, dx, n).unwrap();
//! let q = BoundaryPadding::dirichlet0(n);
//! let laplacian = compose(Operator::leaf(d2), Operator::leaf(q)).unwrap();
//! let neg_laplacian = -laplacian;
//! assert_eq!(neg_laplacian.shape(), (9, 9));
//!
//! // Solve -u'' = 2, whose exact solution u = x(1 - x) the scheme reproduces.
//! let u = neg_laplacian.solve(&vec![2.0f64; n]).unwrap();
//! assert!((u[4] - 0.25).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `fdop-core` | Scalars, errors, coefficients, the leaf contract, dense kernels |
//! | [`stencil`] | `fdop-stencil` | Derivative and upwind stencils, paddings, Fornberg weights |
//! | [`algebra`] | `fdop-algebra` | The operator tree, builders, overloads, coefficient updates |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`fdop-core`).
///
/// Contains [`types::Scalar`], [`types::OperatorError`], the
/// [`types::LeafOperator`] contract and the array-backed leaves.
pub use fdop_core as types;

/// Finite-difference leaves (`fdop-stencil`).
///
/// [`stencil::DerivativeOperator`] and [`stencil::UpwindOperator`] discretize
/// derivatives; [`stencil::BoundaryPadding`] supplies ghost values.
pub use fdop_stencil as stencil;

/// The lazy operator algebra (`fdop-algebra`).
///
/// [`algebra::Operator`] trees are built with [`algebra::build`] or the
/// arithmetic overloads and evaluated through [`algebra::LinearOperator`].
pub use fdop_algebra as algebra;

/// Common imports for typical fdop usage.
///
/// ```rust
/// use fdop::prelude::*;
/// ```
pub mod prelude {
    // Core types and leaves
    pub use fdop_core::{
        ArrayOperator, LeafOperator, NormKind, OperatorError, Scalar, ScalarValue, Shape,
    };

    // Stencils
    pub use fdop_stencil::{
        BoundaryKind, BoundaryPadding, DerivativeOperator, Direction, UpwindOperator,
    };

    // Algebra
    pub use fdop_algebra::{
        add, compose, divide_by_scalar, evaluate, left_divide, multiply, negate, right_divide,
        scale, sub, update_coefficients, LinearOperator, Operator,
    };
}
