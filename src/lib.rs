//! Fixed-step integration of first-order ODEs `dy/dx = f(x, y)` with step-halving precision
//! refinement.
//!
//! Three explicit methods are provided, all with the same calling convention:
//! * [forward Euler](method::euler), global error `O(h)`, one derivative evaluation per step;
//! * [Heun's method](method::heun) (improved Euler), global error `O(h^2)`, two evaluations;
//! * [classical Runge-Kutta](method::rk4), global error `O(h^4)`, four evaluations.
//!
//! On top of them, [`Settings::approximate`] solves a [`Problem`] whose terminal value is known.
//! Starting from an initial number of subdivisions it integrates, rounds the terminal value and
//! the target to the requested number of decimals, and doubles the subdivision count until they
//! agree. Rounding is done on [`rust_decimal::Decimal`] with round-half-to-even by default, and
//! refinement gives up with [`Error::Convergence`] once the subdivision count would exceed a cap.
//!
//! As an example, approximate `e` as the value at `x = 1` of the solution to `y' = y`, `y(0) = 1`:
//!
//! ```
//! use refine_ode::{Method, Problem, Settings};
//!
//! let problem = Problem::new(|_x: f64, y: f64| y, 0., 1., 1., 2.71828182846).unwrap();
//!
//! // Classical Runge-Kutta to 9 decimals, starting from 10 subdivisions.
//! let approximation = Settings::new(Method::Rk4, 9, 10)
//!     .approximate(&problem)
//!     .unwrap();
//!
//! // 10, 20 and 40 subdivisions fall short; 80 is accepted.
//! assert_eq!(approximation.subdivisions(), 80);
//! assert_eq!(approximation.attempts().len(), 4);
//! approx::assert_relative_eq!(
//!     approximation.trace().terminal().y,
//!     core::f64::consts::E,
//!     max_relative = 1e-9,
//! );
//!
//! // Each RK4 step evaluates the derivative four times.
//! assert_eq!(approximation.num_derivative_evals(), 4 * (10 + 20 + 40 + 80));
//! ```
//!
//! Forward Euler needs far more subdivisions for far fewer decimals:
//!
//! ```
//! use refine_ode::{Method, Problem, Settings};
//!
//! let problem = Problem::new(|x: f64, _y: f64| 1. / x, 1., 0., 2., 0.69314718056).unwrap();
//! let approximation = Settings::for_method(Method::Euler)
//!     .approximate(&problem)
//!     .unwrap();
//! assert_eq!(approximation.subdivisions(), 800);
//!
//! let table = refine_ode::output::render_table(approximation.trace(), 3);
//! assert!(table.ends_with("800  2.000  0.693"));
//! ```

pub mod derivative;
pub mod error;
pub mod grid;
pub mod method;
pub mod output;
pub mod refine;
pub mod trace;

pub use derivative::Derivative;
pub use error::{Error, Result};
pub use grid::Grid;
pub use method::Method;
pub use ndarray::ArrayView1;
pub use refine::{Approximation, Attempt, Problem, Rounded, Rounding, Settings, approximate};
pub use rust_decimal::Decimal;
pub use trace::{Sample, Stats, Trace};

/// Scalar type the integration is carried out in.
pub trait Float:
    num_traits::Float
    + core::fmt::Debug
    + core::fmt::Display
    + ndarray::ScalarOperand
    + Send
    + Sync
{
}

impl Float for f32 {}
impl Float for f64 {}
