//! Fixed-step explicit integration methods.
//!
//! Each method lays out a [`Grid`] for the requested step size and advances the ordinate buffer
//! one grid point at a time. All three share a signature so the refinement driver can treat them
//! interchangeably through [`Method`].

use crate::derivative::EvaluationCounter;
use crate::{Derivative, Error, Float, Grid, Result, Stats, Trace};

/// The closed set of supported integration methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Forward Euler. Global error `O(h)`.
    Euler,
    /// Heun's predictor-corrector (improved Euler). Global error `O(h^2)`.
    Heun,
    /// Classical fourth-order Runge-Kutta. Global error `O(h^4)`.
    Rk4,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Euler, Method::Heun, Method::Rk4];

    /// Integrate `f` from `x_init` to `x_final` with step `h`.
    pub fn integrate<F: Float, D: Derivative<F> + ?Sized>(
        self,
        f: &D,
        x_init: F,
        y_init: F,
        h: F,
        x_final: F,
    ) -> Result<Trace<F>> {
        match self {
            Method::Euler => euler(f, x_init, y_init, h, x_final),
            Method::Heun => heun(f, x_init, y_init, h, x_final),
            Method::Rk4 => rk4(f, x_init, y_init, h, x_final),
        }
    }

    /// Order of the global truncation error.
    pub fn order(self) -> u32 {
        match self {
            Method::Euler => 1,
            Method::Heun => 2,
            Method::Rk4 => 4,
        }
    }

    /// Derivative evaluations per step.
    pub fn evals_per_step(self) -> usize {
        match self {
            Method::Euler => 1,
            Method::Heun => 2,
            Method::Rk4 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Euler => "euler",
            Method::Heun => "heun",
            Method::Rk4 => "rk4",
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownMethod(s.to_owned()))
    }
}

/// Forward Euler: `y[i] = y[i-1] + h f(x[i-1], y[i-1])`.
pub fn euler<F: Float, D: Derivative<F> + ?Sized>(
    f: &D,
    x_init: F,
    y_init: F,
    h: F,
    x_final: F,
) -> Result<Trace<F>> {
    let mut grid = Grid::build(x_init, y_init, h, x_final)?;
    let mut f = EvaluationCounter::new(f);

    for i in 1..grid.count() {
        grid.y[i] = grid.y[i - 1] + h * f.evaluate(grid.x[i - 1], grid.y[i - 1])?;
    }

    let stats = Stats {
        num_derivative_evals: f.num_derivative_evals,
    };
    Ok(Trace::new(grid, stats))
}

/// Heun's method: an Euler predictor followed by a trapezoidal corrector.
///
/// The predicted ordinate only feeds the right-hand slope; the stored sample is always the
/// corrected value.
pub fn heun<F: Float, D: Derivative<F> + ?Sized>(
    f: &D,
    x_init: F,
    y_init: F,
    h: F,
    x_final: F,
) -> Result<Trace<F>> {
    let mut grid = Grid::build(x_init, y_init, h, x_final)?;
    let mut f = EvaluationCounter::new(f);
    let two = F::one() + F::one();

    for i in 1..grid.count() {
        let left_tan = f.evaluate(grid.x[i - 1], grid.y[i - 1])?;
        let predictor = grid.y[i - 1] + h * left_tan;
        let right_tan = f.evaluate(grid.x[i], predictor)?;
        grid.y[i] = grid.y[i - 1] + h / two * (left_tan + right_tan);
    }

    let stats = Stats {
        num_derivative_evals: f.num_derivative_evals,
    };
    Ok(Trace::new(grid, stats))
}

/// Classical fourth-order Runge-Kutta.
pub fn rk4<F: Float, D: Derivative<F> + ?Sized>(
    f: &D,
    x_init: F,
    y_init: F,
    h: F,
    x_final: F,
) -> Result<Trace<F>> {
    let mut grid = Grid::build(x_init, y_init, h, x_final)?;
    let mut f = EvaluationCounter::new(f);
    let two = F::one() + F::one();
    let six = two + two + two;

    for i in 1..grid.count() {
        let (x, y) = (grid.x[i - 1], grid.y[i - 1]);
        let k1 = f.evaluate(x, y)?;
        let k2 = f.evaluate(x + h / two, y + h * k1 / two)?;
        let k3 = f.evaluate(x + h / two, y + h * k2 / two)?;
        let k4 = f.evaluate(x + h, y + h * k3)?;
        grid.y[i] = y + h / six * (k1 + two * k2 + two * k3 + k4);
    }

    let stats = Stats {
        num_derivative_evals: f.num_derivative_evals,
    };
    Ok(Trace::new(grid, stats))
}
