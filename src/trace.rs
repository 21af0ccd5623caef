use ndarray as nd;

use crate::{Float, Grid};

/// Statistics from integrating over a grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of derivative function evaluations.
    pub num_derivative_evals: usize,
}

/// One point of a solution trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample<F: Float> {
    pub index: usize,
    pub x: F,
    pub y: F,
}

/// The approximate solution `y(x)` sampled on a grid, starting at the initial condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace<F: Float> {
    x: nd::Array1<F>,
    y: nd::Array1<F>,
    stats: Stats,
}

impl<F: Float> Trace<F> {
    pub(crate) fn new(grid: Grid<F>, stats: Stats) -> Self {
        Self {
            x: grid.x,
            y: grid.y,
            stats,
        }
    }

    /// Number of samples, always at least one.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> nd::ArrayView1<'_, F> {
        self.x.view()
    }

    pub fn y(&self) -> nd::ArrayView1<'_, F> {
        self.y.view()
    }

    pub fn sample(&self, index: usize) -> Option<Sample<F>> {
        Some(Sample {
            index,
            x: *self.x.get(index)?,
            y: *self.y.get(index)?,
        })
    }

    /// The last sample, whose ordinate is compared against the target.
    pub fn terminal(&self) -> Sample<F> {
        let index = self.len() - 1;
        Sample {
            index,
            x: self.x[index],
            y: self.y[index],
        }
    }

    /// Iterate over `(index, x, y)` samples in grid order.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = Sample<F>> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .enumerate()
            .map(|(index, (&x, &y))| Sample { index, x, y })
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}
