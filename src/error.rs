//! Errors produced while building grids, integrating and refining.

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong in a run.
///
/// Floating point payloads are widened to `f64` so the error type does not depend on the scalar
/// type of the integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The interval is malformed or the step is not positive.
    #[error("invalid interval [{x_init}, {x_final}] with step {step}")]
    InvalidInterval { x_init: f64, x_final: f64, step: f64 },

    /// The derivative function returned NaN or an infinity.
    #[error("derivative evaluated to {value} at x = {x}, y = {y}")]
    DerivativeEvaluation { x: f64, y: f64, value: f64 },

    /// The subdivision cap was reached before the terminal value matched the target.
    #[error(
        "no match to {decimals} decimals after {subdivisions} subdivisions: \
         approximation {approximation}, target {target}"
    )]
    Convergence {
        subdivisions: usize,
        approximation: f64,
        target: f64,
        decimals: u32,
    },

    /// A value could not be converted to a decimal for rounding.
    #[error("{value} cannot be represented as a decimal")]
    Unrepresentable { value: f64 },

    /// Rejected settings or problem definition.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An unknown method name.
    #[error("unknown method `{0}`, expected one of euler, heun, rk4")]
    UnknownMethod(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Widen a scalar for error reporting.
pub(crate) fn widen<F: num_traits::ToPrimitive>(value: F) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
