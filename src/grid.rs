use ndarray as nd;
use num_traits::cast;

use crate::{Error, Float, Result, error::widen};

/// Sample abscissas and an ordinate buffer seeded with the initial condition.
#[derive(Clone, Debug)]
pub struct Grid<F: Float> {
    /// Evenly spaced abscissas from `x_init` to `x_final` inclusive.
    pub x: nd::Array1<F>,
    /// Ordinates, zero except for `y[0] = y_init`.
    pub y: nd::Array1<F>,
}

impl<F: Float> Grid<F> {
    /// Lay out a grid over `[x_init, x_final]` for step size `h`.
    ///
    /// The number of points is `ceil((x_final - x_init) / h) + 1`. The abscissas are spread
    /// linearly over that many points, so when the interval is not a multiple of `h` the spacing
    /// differs slightly from `h` while the update formulas keep stepping by `h`.
    ///
    /// A step so small that the buffers cannot be allocated is rejected like a malformed interval.
    ///
    /// ```
    /// let grid = refine_ode::Grid::build(0., 1., 0.3, 1.).unwrap();
    /// assert_eq!(grid.count(), 5);
    /// assert_eq!(grid.x[0], 0.);
    /// assert_eq!(grid.y.to_vec(), vec![1., 0., 0., 0., 0.]);
    /// ```
    pub fn build(x_init: F, y_init: F, h: F, x_final: F) -> Result<Self> {
        let invalid = || Error::InvalidInterval {
            x_init: widen(x_init),
            x_final: widen(x_final),
            step: widen(h),
        };

        let all_finite = [x_init, y_init, h, x_final].iter().all(|v| v.is_finite());
        // Written as negations so NaN is rejected too.
        if !all_finite || !(h > F::zero()) || !(x_final >= x_init) {
            return Err(invalid());
        }

        let num_steps = ((x_final - x_init) / h).ceil();
        let count = cast::<_, usize>(num_steps)
            .and_then(|steps| steps.checked_add(1))
            .ok_or_else(invalid)?;

        // Reserve up front so an oversized grid is an error rather than an allocation abort.
        let mut x: Vec<F> = Vec::new();
        let mut y: Vec<F> = Vec::new();
        if x.try_reserve_exact(count).is_err() || y.try_reserve_exact(count).is_err() {
            return Err(invalid());
        }

        // Same spacing as `Array1::linspace`.
        let step = match count {
            1 => F::zero(),
            _ => (x_final - x_init) / cast::<_, F>(count - 1).ok_or_else(invalid)?,
        };
        for i in 0..count {
            x.push(x_init + step * cast::<_, F>(i).ok_or_else(invalid)?);
        }
        y.resize(count, F::zero());
        y[0] = y_init;

        Ok(Self {
            x: nd::Array1::from_vec(x),
            y: nd::Array1::from_vec(y),
        })
    }

    /// Number of grid points, always at least one.
    pub fn count(&self) -> usize {
        self.x.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_follows_ceiling_rule() {
        for &(x_init, h, x_final) in &[
            (0., 0.1, 1.),
            (0., 0.3, 1.),
            (1., 0.25, 2.),
            (-3., 0.7, 4.5),
            (0., 2., 1.),
            (2., 1e-3, 2.5),
        ] {
            let grid = Grid::<f64>::build(x_init, 0., h, x_final).unwrap();
            let expected = ((x_final - x_init) / h).ceil() as usize + 1;
            assert_eq!(grid.count(), expected, "h = {h}");
            assert_eq!(grid.y.len(), expected);
            assert_eq!(grid.x[0], x_init);
            approx::assert_relative_eq!(grid.x[expected - 1], x_final, epsilon = 1e-12);
        }
    }

    #[test]
    fn abscissas_are_evenly_spaced() {
        let grid = Grid::build(0f64, 0., 0.3, 1.).unwrap();
        let spacing = grid.x[1] - grid.x[0];
        approx::assert_relative_eq!(spacing, 0.25);
        for i in 1..grid.count() {
            approx::assert_relative_eq!(grid.x[i] - grid.x[i - 1], spacing, epsilon = 1e-12);
        }
    }

    #[test]
    fn matches_ndarray_linspace() {
        let grid = Grid::build(-1.5f64, 0., 0.07, 2.).unwrap();
        let expected = nd::Array1::linspace(-1.5, 2., grid.count());
        assert_eq!(grid.x, expected);
    }

    #[test]
    fn ordinates_are_seeded() {
        let grid = Grid::build(0f32, 7., 0.5, 2.).unwrap();
        assert_eq!(grid.y[0], 7.);
        assert!(grid.y.iter().skip(1).all(|&y| y == 0.));
    }

    #[test]
    fn degenerate_interval_is_a_single_point() {
        let grid = Grid::build(1f64, 4., 0.1, 1.).unwrap();
        assert_eq!(grid.count(), 1);
        assert_eq!(grid.x[0], 1.);
        assert_eq!(grid.y[0], 4.);
    }

    #[test]
    fn rejects_malformed_intervals() {
        for &(x_init, h, x_final) in &[
            (0., 0., 1.),
            (0., -0.1, 1.),
            (1., 0.1, 0.),
            (0., f64::NAN, 1.),
            (f64::NEG_INFINITY, 0.1, 1.),
            (0., 1e-300, 1e300),
            (0., 1e-17, 1.),
        ] {
            assert!(
                matches!(
                    Grid::build(x_init, 0., h, x_final),
                    Err(Error::InvalidInterval { .. })
                ),
                "accepted [{x_init}, {x_final}] with step {h}"
            );
        }
    }
}
