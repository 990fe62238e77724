//! Finite-difference stencils and the convolution engine.
//!
//! Provides the leaf operators that discretize derivatives on a uniform
//! one-dimensional grid:
//!
//! - [`DerivativeOperator`]: centered-difference stencil with one-sided
//!   boundary rows, applied matrix-free by the [`convolution`] engine
//! - [`UpwindOperator`]: per-row forward/backward one-sided stencils,
//!   evaluated in parallel
//! - [`BoundaryPadding`]: homogeneous ghost-point paddings (Dirichlet-zero,
//!   Neumann-zero, periodic) that turn an `N × (N+2)` stencil into a square
//!   operator by composition
//!
//! Stencil weights come from [`fornberg_weights`].
//!
//! Every derivative operator maps a padded input of length `N + 2` (the
//! grid plus one ghost value at each end) to `N` output points.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod convolution;
pub mod derivative;
pub mod fornberg;
pub mod padding;
pub mod upwind;

pub use derivative::{DerivativeOperator, DerivativeOperatorBuilder, VectorUpdateRule};
pub use fornberg::{fornberg_weights, StencilRow};
pub use padding::{BoundaryKind, BoundaryPadding};
pub use upwind::{Direction, DirectionRule, UpwindOperator, UpwindOperatorBuilder};
