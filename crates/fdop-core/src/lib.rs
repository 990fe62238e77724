//! Core types and traits for fdop, lazily-composable finite-difference
//! operators.
//!
//! This is the leaf crate of the workspace. It defines the abstractions
//! every other crate builds on:
//!
//! - [`Scalar`]: the floating-point element type (`f32` or `f64`)
//! - [`OperatorError`]: the single error enum shared by every operation
//! - [`ScalarValue`]: a coefficient with an optional time-dependent update rule
//! - [`LeafOperator`]: the contract a primitive operator implements to
//!   participate in the operator algebra
//! - dense kernels ([`LuFactors`], [`matrix_norm`], [`expm`]) and the
//!   array-backed leaves [`ArrayOperator`] and [`FactorizedOperator`]
//! - sparse and banded materialization ([`SparseMatrix`], [`BandedMatrix`])

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod coefficient;
pub mod dense;
pub mod error;
pub mod leaf;
pub mod norm;
pub mod scalar;
pub mod sparse;

pub use array::{ArrayOperator, FactorizedOperator, MatrixUpdateRule};
pub use coefficient::{ScalarValue, UpdateRule};
pub use dense::{expm, matvec_into, powi, unit_vector, LuFactors};
pub use error::OperatorError;
pub use leaf::{LeafOperator, Shape};
pub use norm::{matrix_norm, vector_norm, NormKind};
pub use scalar::Scalar;
pub use sparse::{BandedMatrix, SparseMatrix};
