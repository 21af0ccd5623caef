//! Step-halving precision refinement.
//!
//! The driver integrates with `n` subdivisions, rounds the terminal value and the target to the
//! requested number of decimals, and doubles `n` until the two agree. Unlike a bare loop it stops
//! at a configurable subdivision cap and reports [`Error::Convergence`] instead of spinning
//! forever on an unreachable target.

use num_traits::cast;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{Derivative, Error, Float, Method, Result, Trace, error::widen};

/// Largest number of decimals a comparison can ask for.
pub const MAX_DECIMALS: u32 = 28;

/// Default cap on the subdivision count.
pub const DEFAULT_MAX_SUBDIVISIONS: usize = 1 << 22;

/// Rule for rounding to the requested number of decimals.
///
/// Values are first converted to a [`Decimal`] holding the digits of their binary
/// representation, so `0.125` is a true midpoint while `0.15` is not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Ties go to the even digit.
    #[default]
    HalfEven,
    /// Ties go away from zero.
    HalfAwayFromZero,
}

impl Rounding {
    /// Round `value` to `decimals` places.
    ///
    /// Finite values too large for a [`Decimal`] are already integers, so rounding leaves them
    /// untouched and they are kept as [`Rounded::Integral`].
    ///
    /// ```
    /// use refine_ode::{Rounded, Rounding};
    ///
    /// assert_eq!(Rounding::HalfEven.round(0.125, 2).unwrap().to_string(), "0.12");
    /// assert_eq!(Rounding::HalfAwayFromZero.round(0.125, 2).unwrap().to_string(), "0.13");
    /// assert_eq!(Rounding::HalfEven.round(1e30, 3).unwrap(), Rounded::Integral(1e30));
    /// ```
    pub fn round<F: Float>(self, value: F, decimals: u32) -> Result<Rounded> {
        let value = widen(value);
        if !value.is_finite() {
            return Err(Error::Unrepresentable { value });
        }
        Ok(match Decimal::from_f64_retain(value) {
            Some(decimal) => {
                Rounded::Decimal(decimal.round_dp_with_strategy(decimals, self.strategy()))
            }
            None => Rounded::Integral(value),
        })
    }

    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::HalfEven => RoundingStrategy::MidpointNearestEven,
            Rounding::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// A value rounded to a fixed number of decimals.
///
/// Values of the two variants never compare equal: every [`Rounded::Integral`] lies beyond the
/// range of a [`Decimal`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rounded {
    Decimal(Decimal),
    /// A finite value beyond the range of [`Decimal`], which is always a whole number.
    Integral(f64),
}

impl core::fmt::Display for Rounded {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Rounded::Decimal(decimal) => write!(f, "{decimal}"),
            Rounded::Integral(value) => write!(f, "{value:.0}"),
        }
    }
}

/// An initial value problem with a known terminal value.
#[derive(Clone, Debug)]
pub struct Problem<F: Float, D> {
    derivative: D,
    x_init: F,
    y_init: F,
    x_final: F,
    target: F,
}

impl<F: Float, D: Derivative<F>> Problem<F, D> {
    /// Define `dy/dx = f(x, y)`, `y(x_init) = y_init`, whose solution should reach `target` at
    /// `x_final`.
    pub fn new(derivative: D, x_init: F, y_init: F, x_final: F, target: F) -> Result<Self> {
        let all_finite = [x_init, y_init, x_final, target]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite || !(x_final > x_init) {
            return Err(Error::InvalidInterval {
                x_init: widen(x_init),
                x_final: widen(x_final),
                step: widen(x_final - x_init),
            });
        }
        Ok(Self {
            derivative,
            x_init,
            y_init,
            x_final,
            target,
        })
    }

    pub fn derivative(&self) -> &D {
        &self.derivative
    }
    pub fn x_init(&self) -> F {
        self.x_init
    }
    pub fn y_init(&self) -> F {
        self.y_init
    }
    pub fn x_final(&self) -> F {
        self.x_final
    }
    pub fn target(&self) -> F {
        self.target
    }
}

/// How a problem is refined: method, precision and subdivision schedule.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    method: Method,
    /// Number of decimals the terminal value must agree on.
    decimals: u32,
    /// Subdivision count of the first attempt.
    initial_subdivisions: usize,
    /// Refinement gives up once doubling would exceed this.
    #[serde(default = "default_max_subdivisions")]
    max_subdivisions: usize,
    #[serde(default)]
    rounding: Rounding,
}

fn default_max_subdivisions() -> usize {
    DEFAULT_MAX_SUBDIVISIONS
}

impl Settings {
    pub fn new(method: Method, decimals: u32, initial_subdivisions: usize) -> Self {
        Self {
            method,
            decimals,
            initial_subdivisions,
            max_subdivisions: DEFAULT_MAX_SUBDIVISIONS,
            rounding: Rounding::default(),
        }
    }

    /// Precision presets: Euler to 3 decimals from 50 subdivisions, Heun to 5 from 10 and RK4 to
    /// 9 from 10.
    pub fn for_method(method: Method) -> Self {
        match method {
            Method::Euler => Self::new(method, 3, 50),
            Method::Heun => Self::new(method, 5, 10),
            Method::Rk4 => Self::new(method, 9, 10),
        }
    }

    pub fn with_decimals(self, decimals: u32) -> Self {
        Self { decimals, ..self }
    }
    pub fn with_initial_subdivisions(self, initial_subdivisions: usize) -> Self {
        Self {
            initial_subdivisions,
            ..self
        }
    }
    pub fn with_max_subdivisions(self, max_subdivisions: usize) -> Self {
        Self {
            max_subdivisions,
            ..self
        }
    }
    pub fn with_rounding(self, rounding: Rounding) -> Self {
        Self { rounding, ..self }
    }

    pub fn method(&self) -> Method {
        self.method
    }
    pub fn decimals(&self) -> u32 {
        self.decimals
    }
    pub fn initial_subdivisions(&self) -> usize {
        self.initial_subdivisions
    }
    pub fn max_subdivisions(&self) -> usize {
        self.max_subdivisions
    }
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn validate(&self) -> Result<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(Error::InvalidConfig(format!(
                "decimals must be at most {MAX_DECIMALS}, got {}",
                self.decimals
            )));
        }
        if self.initial_subdivisions == 0 {
            return Err(Error::InvalidConfig(
                "initial subdivisions must be positive".into(),
            ));
        }
        if self.initial_subdivisions > self.max_subdivisions {
            return Err(Error::InvalidConfig(format!(
                "initial subdivisions {} exceed the cap of {}",
                self.initial_subdivisions, self.max_subdivisions
            )));
        }
        Ok(())
    }

    /// Refine `problem` until its terminal value matches the target.
    ///
    /// Derivative and interval errors abort immediately. If the cap is reached first the last
    /// attempt is reported in [`Error::Convergence`].
    pub fn approximate<F: Float, D: Derivative<F>>(
        &self,
        problem: &Problem<F, D>,
    ) -> Result<Approximation<F>> {
        self.validate()?;

        let target = self.rounding.round(problem.target, self.decimals)?;
        let span = problem.x_final - problem.x_init;
        let mut subdivisions = self.initial_subdivisions;
        let mut attempts = Vec::new();
        let mut num_derivative_evals = 0;

        loop {
            let h = span
                / cast::<_, F>(subdivisions).ok_or_else(|| {
                    Error::InvalidConfig(format!("{subdivisions} subdivisions overflow the scalar"))
                })?;
            let trace = self.method.integrate(
                &problem.derivative,
                problem.x_init,
                problem.y_init,
                h,
                problem.x_final,
            )?;
            num_derivative_evals += trace.stats().num_derivative_evals;

            let terminal = trace.terminal().y;
            attempts.push(Attempt {
                subdivisions,
                terminal,
            });
            let rounded = self.rounding.round(terminal, self.decimals)?;
            log::debug!(
                "{} with n = {subdivisions}, h = {h}: terminal {terminal} rounds to {rounded}, target {target}",
                self.method
            );

            if rounded == target {
                log::info!(
                    "{} matched {target} to {} decimals with n = {subdivisions}",
                    self.method,
                    self.decimals
                );
                return Ok(Approximation {
                    trace,
                    subdivisions,
                    attempts,
                    num_derivative_evals,
                });
            }

            match subdivisions
                .checked_mul(2)
                .filter(|&next| next <= self.max_subdivisions)
            {
                Some(next) => subdivisions = next,
                None => {
                    log::warn!(
                        "{} gave up at n = {subdivisions}: {rounded} != {target}",
                        self.method
                    );
                    return Err(Error::Convergence {
                        subdivisions,
                        approximation: widen(terminal),
                        target: widen(problem.target),
                        decimals: self.decimals,
                    });
                }
            }
        }
    }
}

/// One refinement attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attempt<F: Float> {
    pub subdivisions: usize,
    pub terminal: F,
}

/// The accepted result of a refinement.
#[derive(Clone, Debug)]
pub struct Approximation<F: Float> {
    trace: Trace<F>,
    subdivisions: usize,
    attempts: Vec<Attempt<F>>,
    num_derivative_evals: usize,
}

impl<F: Float> Approximation<F> {
    /// The accepted solution trace.
    pub fn trace(&self) -> &Trace<F> {
        &self.trace
    }
    pub fn into_trace(self) -> Trace<F> {
        self.trace
    }
    /// Subdivision count of the accepted trace.
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }
    /// Every attempt in order, the accepted one last.
    pub fn attempts(&self) -> &[Attempt<F>] {
        &self.attempts
    }
    /// Derivative evaluations summed over all attempts.
    pub fn num_derivative_evals(&self) -> usize {
        self.num_derivative_evals
    }
}

/// Refine with `n_init` initial subdivisions, doubling until the terminal value matches `target`
/// to `decimals` places, and return the accepted trace.
///
/// Uses [`DEFAULT_MAX_SUBDIVISIONS`] and [`Rounding::HalfEven`]; build [`Settings`] to change
/// either.
#[allow(clippy::too_many_arguments)]
pub fn approximate<F: Float, D: Derivative<F>>(
    method: Method,
    f: D,
    x_init: F,
    y_init: F,
    x_final: F,
    target: F,
    decimals: u32,
    n_init: usize,
) -> Result<Trace<F>> {
    let problem = Problem::new(f, x_init, y_init, x_final, target)?;
    Settings::new(method, decimals, n_init)
        .approximate(&problem)
        .map(Approximation::into_trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_rhs(_x: f64, y: f64) -> f64 {
        y
    }
    fn log_rhs(x: f64, _y: f64) -> f64 {
        1. / x
    }
    fn arctan_rhs(x: f64, _y: f64) -> f64 {
        4. / (1. + x * x)
    }

    type Rhs = fn(f64, f64) -> f64;

    fn reference_problems() -> [Problem<f64, Rhs>; 3] {
        [
            Problem::new(exp_rhs as Rhs, 0., 1., 1., 2.71828182846).unwrap(),
            Problem::new(log_rhs as Rhs, 1., 0., 2., 0.69314718056).unwrap(),
            Problem::new(arctan_rhs as Rhs, 0., 0., 1., 3.14159265359).unwrap(),
        ]
    }

    #[test]
    fn reference_problems_converge_at_known_counts() {
        let expected = [
            [3200, 320, 80], // e
            [800, 160, 40],  // ln 2
            [1600, 160, 20], // pi
        ];
        for (problem, counts) in reference_problems().iter().zip(expected) {
            for (method, count) in Method::ALL.into_iter().zip(counts) {
                let approximation = Settings::for_method(method).approximate(problem).unwrap();
                assert_eq!(approximation.subdivisions(), count, "{method}");
                assert_eq!(approximation.trace().len(), count + 1);
                let steps: usize = approximation.attempts().iter().map(|a| a.subdivisions).sum();
                assert_eq!(
                    approximation.num_derivative_evals(),
                    steps * method.evals_per_step()
                );
            }
        }
    }

    #[test]
    fn euler_log_baseline() {
        let [_, ln2, _] = reference_problems();
        let approximation = Settings::for_method(Method::Euler)
            .approximate(&ln2)
            .unwrap();

        let counts: Vec<_> = approximation
            .attempts()
            .iter()
            .map(|attempt| attempt.subdivisions)
            .collect();
        assert_eq!(counts, vec![50, 100, 200, 400, 800]);

        approx::assert_relative_eq!(
            approximation.trace().terminal().y,
            0.6934597782161764,
            epsilon = 1e-12
        );
        approx::assert_relative_eq!(approximation.trace().terminal().x, 2., epsilon = 1e-12);
        assert_eq!(
            approximation.num_derivative_evals(),
            50 + 100 + 200 + 400 + 800
        );

        // Euler overestimates a decreasing integrand, approaching ln 2 from above.
        let terminals: Vec<_> = approximation.attempts().iter().map(|a| a.terminal).collect();
        assert!(terminals.windows(2).all(|w| w[1] < w[0]));
        assert!(terminals.iter().all(|&t| t > core::f64::consts::LN_2));
    }

    #[test]
    fn attempts_shrink_error_by_order() {
        let [e, _, _] = reference_problems();
        let approximation = Settings::for_method(Method::Heun)
            .approximate(&e)
            .unwrap();
        let errors: Vec<_> = approximation
            .attempts()
            .iter()
            .map(|a| (a.terminal - core::f64::consts::E).abs())
            .collect();
        for pair in errors.windows(2) {
            approx::assert_relative_eq!(pair[0] / pair[1], 4., max_relative = 0.15);
        }
    }

    #[test]
    fn unreachable_target_hits_the_cap() {
        let problem = Problem::new(exp_rhs, 0., 1., 1., 3.).unwrap();
        let result = Settings::for_method(Method::Euler)
            .with_max_subdivisions(1000)
            .approximate(&problem);
        match result {
            Err(Error::Convergence {
                subdivisions,
                approximation,
                target,
                decimals,
            }) => {
                assert_eq!(subdivisions, 800);
                approx::assert_relative_eq!(approximation, 2.716584846682537, epsilon = 1e-12);
                assert_eq!(target, 3.);
                assert_eq!(decimals, 3);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn excessive_precision_hits_the_cap() {
        let [e, _, _] = reference_problems();
        let result = Settings::for_method(Method::Euler)
            .with_decimals(12)
            .with_max_subdivisions(1 << 12)
            .approximate(&e);
        assert!(matches!(result, Err(Error::Convergence { .. })));
    }

    #[test]
    fn rounding_rule_decides_midpoints() {
        let constant = |_x: f64, _y: f64| 0.;
        let problem = Problem::new(constant, 0., 0.125, 1., 0.13).unwrap();
        let settings = Settings::new(Method::Euler, 2, 1).with_max_subdivisions(8);

        assert!(matches!(
            settings.approximate(&problem),
            Err(Error::Convergence { subdivisions: 8, .. })
        ));

        let approximation = settings
            .with_rounding(Rounding::HalfAwayFromZero)
            .approximate(&problem)
            .unwrap();
        assert_eq!(approximation.subdivisions(), 1);
        assert_eq!(approximation.attempts().len(), 1);
    }

    #[test]
    fn rounding_handles_negative_values() {
        assert_eq!(
            Rounding::HalfEven.round(-2.5f64, 0).unwrap(),
            Rounded::Decimal(Decimal::from(-2))
        );
        assert_eq!(
            Rounding::HalfAwayFromZero.round(-2.5f64, 0).unwrap(),
            Rounded::Decimal(Decimal::from(-3))
        );
        assert!(matches!(
            Rounding::HalfEven.round(f64::NAN, 3),
            Err(Error::Unrepresentable { .. })
        ));
    }

    #[test]
    fn targets_beyond_decimal_range() {
        let constant = |_x: f64, _y: f64| 0.;

        let problem = Problem::new(constant, 0., 1e30, 1., 1e30).unwrap();
        let approximation = Settings::new(Method::Euler, 3, 1)
            .approximate(&problem)
            .unwrap();
        assert_eq!(approximation.subdivisions(), 1);
        assert_eq!(approximation.trace().terminal().y, 1e30);

        for (y_init, target) in [(1e30, 2e30), (1e30, 5.), (5., 1e30)] {
            let problem = Problem::new(constant, 0., y_init, 1., target).unwrap();
            assert!(matches!(
                Settings::new(Method::Heun, 2, 1)
                    .with_max_subdivisions(4)
                    .approximate(&problem),
                Err(Error::Convergence { subdivisions: 4, .. })
            ));
        }

        assert_eq!(
            Rounding::HalfEven.round(-1e30f64, 5).unwrap().to_string(),
            "-1000000000000000019884624838656"
        );
        assert!(matches!(
            Rounding::HalfEven.round(f64::INFINITY, 3),
            Err(Error::Unrepresentable { .. })
        ));
    }

    #[test]
    fn derivative_errors_are_fatal() {
        let problem = Problem::new(log_rhs, 0., 0., 1., 1.).unwrap();
        for method in Method::ALL {
            assert!(matches!(
                Settings::for_method(method).approximate(&problem),
                Err(Error::DerivativeEvaluation { .. })
            ));
        }
    }

    #[test]
    fn rejects_invalid_settings() {
        let [e, _, _] = reference_problems();
        for settings in [
            Settings::for_method(Method::Rk4).with_decimals(MAX_DECIMALS + 1),
            Settings::for_method(Method::Rk4).with_initial_subdivisions(0),
            Settings::for_method(Method::Rk4).with_max_subdivisions(5),
        ] {
            assert!(matches!(
                settings.approximate(&e),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn rejects_invalid_problems() {
        assert!(matches!(
            Problem::new(exp_rhs, 1., 0., 1., 0.),
            Err(Error::InvalidInterval { .. })
        ));
        assert!(matches!(
            Problem::new(exp_rhs, 0., f64::NAN, 1., 0.),
            Err(Error::InvalidInterval { .. })
        ));
    }

    #[test]
    fn settings_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"method": "rk4", "decimals": 7, "initial_subdivisions": 4}"#)
                .unwrap();
        assert_eq!(settings, Settings::new(Method::Rk4, 7, 4));

        let settings: Settings = serde_json::from_str(
            r#"{"method": "heun", "decimals": 2, "initial_subdivisions": 1,
                "max_subdivisions": 64, "rounding": "half_away_from_zero"}"#,
        )
        .unwrap();
        assert_eq!(settings.max_subdivisions(), 64);
        assert_eq!(settings.rounding(), Rounding::HalfAwayFromZero);

        assert!(
            serde_json::from_str::<Settings>(
                r#"{"method": "rk4", "decimals": 7, "initial_subdivisions": 4, "n": 1}"#
            )
            .is_err()
        );
    }

    #[test]
    fn free_function_returns_the_trace() {
        let trace = approximate(Method::Rk4, exp_rhs, 0., 1., 1., 2.71828182846, 9, 10).unwrap();
        assert_eq!(trace.len(), 81);
        assert_eq!(trace.sample(0).unwrap().y, 1.);
    }
}
