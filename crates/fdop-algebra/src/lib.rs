//! Lazy operator algebra for fdop.
//!
//! An [`Operator`] is a tree whose leaves are primitive operators
//! ([`fdop_core::LeafOperator`]) and whose interior nodes are:
//!
//! - [`ScaledOperator`]: `c * A`
//! - [`OperatorCombination`]: `A + B + ...`
//! - [`OperatorComposition`]: `A ∘ B ∘ ...`
//!
//! Nothing is materialized until asked: [`LinearOperator::apply_into`]
//! walks the tree with instance-owned scratch buffers, while
//! [`LinearOperator::to_matrix`], [`Operator::to_sparse`] and
//! [`Operator::to_banded`] build concrete representations on demand.
//!
//! Build trees with the functions in [`build`] or the arithmetic overloads;
//! push time-dependent state with [`coordinator::update_coefficients`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod build;
pub mod combination;
pub mod composition;
pub mod coordinator;
pub mod operator;
pub mod ops;
pub mod protocol;
pub mod scaled;

pub use build::{
    add, compose, divide_by_scalar, left_divide, multiply, negate, right_divide, scale, sub,
};
pub use combination::OperatorCombination;
pub use composition::OperatorComposition;
pub use coordinator::{evaluate, is_constant, update_coefficients};
pub use operator::Operator;
pub use protocol::LinearOperator;
pub use scaled::ScaledOperator;
