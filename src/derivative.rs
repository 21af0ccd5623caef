use crate::{Error, Float, Result, error::widen};

/// The right-hand side `f(x, y)` of `dy/dx = f(x, y)`.
///
/// Implementations must be pure and deterministic: the methods call `evaluate` several times per
/// step and rely on identical inputs producing identical outputs. A NaN or infinite result is
/// reported as [`Error::DerivativeEvaluation`] and aborts the integration.
///
/// Any `Fn(F, F) -> F` closure or function pointer is a derivative:
///
/// ```
/// use refine_ode::Derivative;
///
/// let f = |x: f64, y: f64| x * y;
/// assert_eq!(f.evaluate(2., 3.), 6.);
/// ```
pub trait Derivative<F: Float> {
    /// Evaluate `f(x, y)`.
    fn evaluate(&self, x: F, y: F) -> F;
}

impl<F: Float, G: Fn(F, F) -> F> Derivative<F> for G {
    fn evaluate(&self, x: F, y: F) -> F {
        self(x, y)
    }
}

/// Wraps a derivative to count evaluations and reject non-finite slopes.
pub(crate) struct EvaluationCounter<'a, D: ?Sized> {
    derivative: &'a D,
    pub(crate) num_derivative_evals: usize,
}

impl<'a, D: ?Sized> EvaluationCounter<'a, D> {
    pub(crate) fn new(derivative: &'a D) -> Self {
        Self {
            derivative,
            num_derivative_evals: 0,
        }
    }

    pub(crate) fn evaluate<F: Float>(&mut self, x: F, y: F) -> Result<F>
    where
        D: Derivative<F>,
    {
        self.num_derivative_evals += 1;
        let value = self.derivative.evaluate(x, y);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::DerivativeEvaluation {
                x: widen(x),
                y: widen(y),
                value: widen(value),
            })
        }
    }
}
