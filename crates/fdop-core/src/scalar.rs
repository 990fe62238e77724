//! The floating-point element type shared by every operator.

use ndarray::NdFloat;

/// Element type of operators, vectors and coefficients.
///
/// Implemented for `f32` and `f64`. Everything the algebra needs from a
/// float (zero, one, `abs`, `powi`, `sqrt`, ndarray scalar products) comes
/// through the [`NdFloat`] supertrait.
pub trait Scalar: NdFloat {
    /// Convert an `f64` literal into this scalar type (lossy for `f32`).
    fn cast(value: f64) -> Self;
}

impl Scalar for f64 {
    fn cast(value: f64) -> Self {
        value
    }
}

impl Scalar for f32 {
    fn cast(value: f64) -> Self {
        value as f32
    }
}
