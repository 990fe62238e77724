//! Scalar coefficients with optional state/time-dependent update rules.

use crate::scalar::Scalar;
use std::fmt;
use std::sync::Arc;

/// Recomputes a coefficient from the current state.
///
/// Called only by the coefficient-update coordinator with the previous
/// value, the state vector `u`, the parameter vector `p` and the time `t`.
/// Any `Fn(T, &[T], &[T], T) -> T` closure implements this trait.
pub trait UpdateRule<T>: Send + Sync {
    /// Return the new coefficient value.
    fn update(&self, value: T, u: &[T], p: &[T], t: T) -> T;
}

impl<T, F> UpdateRule<T> for F
where
    F: Fn(T, &[T], &[T], T) -> T + Send + Sync,
{
    fn update(&self, value: T, u: &[T], p: &[T], t: T) -> T {
        self(value, u, p, t)
    }
}

/// A dimensionless scalar used as an operator coefficient.
///
/// Behaves as a plain `T` in all arithmetic via [`value`](Self::value).
/// A coefficient is constant in time exactly when it carries no update rule.
///
/// ```
/// use fdop_core::ScalarValue;
///
/// let mut c = ScalarValue::with_rule(1.0, |_v, _u: &[f64], _p: &[f64], t| 2.0 * t);
/// assert!(!c.is_constant());
/// c.update(&[], &[], 3.0);
/// assert_eq!(c.value(), 6.0);
/// ```
#[derive(Clone)]
pub struct ScalarValue<T> {
    value: T,
    rule: Option<Arc<dyn UpdateRule<T>>>,
}

impl<T: Scalar> ScalarValue<T> {
    /// A time-invariant coefficient.
    pub fn constant(value: T) -> Self {
        Self { value, rule: None }
    }

    /// A coefficient recomputed from `(value, u, p, t)` on every update.
    pub fn with_rule<F>(value: T, rule: F) -> Self
    where
        F: Fn(T, &[T], &[T], T) -> T + Send + Sync + 'static,
    {
        Self {
            value,
            rule: Some(Arc::new(rule)),
        }
    }

    /// A coefficient driven by an already-shared update rule.
    pub fn with_update_rule(value: T, rule: Arc<dyn UpdateRule<T>>) -> Self {
        Self {
            value,
            rule: Some(rule),
        }
    }

    /// Current value.
    pub fn value(&self) -> T {
        self.value
    }

    /// `true` if no update rule is bound.
    pub fn is_constant(&self) -> bool {
        self.rule.is_none()
    }

    /// `true` if the current value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.value == T::zero()
    }

    /// Recompute the value from its update rule. No-op for constants.
    pub fn update(&mut self, u: &[T], p: &[T], t: T) {
        if let Some(rule) = &self.rule {
            self.value = rule.update(self.value, u, p, t);
        }
    }
}

impl<T: Scalar> From<T> for ScalarValue<T> {
    fn from(value: T) -> Self {
        Self::constant(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for ScalarValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarValue")
            .field("value", &self.value)
            .field("has_rule", &self.rule.is_some())
            .finish()
    }
}
