//! Simulated uncertainty intervals
//!
//! Future trend changes arrive as a Poisson process at the rate observed
//! in the history, with Laplace distributed magnitudes; observation noise
//! is Gaussian. Intervals are percentiles of the simulated paths.

use super::trend::PiecewiseLinearTrend;
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use series_math::stats::percentile_of_sorted;

/// Inputs of one simulation, all trend quantities in scaled units
pub(crate) struct IntervalSimulation<'a> {
    pub trend: &'a PiecewiseLinearTrend,
    /// Scaled time of each requested point
    pub t: &'a [f64],
    /// Seasonal contribution of each point, already unscaled
    pub seasonal: &'a [f64],
    pub y_scale: f64,
    /// Residual standard deviation in scaled units
    pub sigma_obs: f64,
    pub samples: usize,
    pub interval_width: f64,
    pub seed: u64,
}

impl IntervalSimulation<'_> {
    /// Lower and upper bound for every point
    pub(crate) fn run(&self) -> Result<Vec<(f64, f64)>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = Normal::new(0.0, self.sigma_obs).map_err(|e| {
            ForecastError::InvalidParameter(format!("Invalid observation noise: {}", e))
        })?;

        let t_max = self.t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let change_rate = self.trend.changepoints.len() as f64;
        let laplace_scale = self.trend.mean_abs_delta() + 1e-8;

        let mut paths = vec![Vec::with_capacity(self.samples); self.t.len()];
        for _ in 0..self.samples {
            let (locations, deltas) = if t_max > 1.0 && change_rate > 0.0 {
                self.sample_future_changes(&mut rng, t_max, change_rate, laplace_scale)?
            } else {
                (Vec::new(), Vec::new())
            };

            for (i, &ti) in self.t.iter().enumerate() {
                let extra: f64 = locations
                    .iter()
                    .zip(&deltas)
                    .map(|(&s, &d)| d * (ti - s).max(0.0))
                    .sum();
                let scaled = self.trend.evaluate(ti) + extra + noise.sample(&mut rng);
                paths[i].push(scaled * self.y_scale + self.seasonal[i]);
            }
        }

        let lower_q = 100.0 * (1.0 - self.interval_width) / 2.0;
        let upper_q = 100.0 * (1.0 + self.interval_width) / 2.0;
        paths
            .into_iter()
            .map(|mut samples| -> Result<(f64, f64)> {
                samples.sort_by(f64::total_cmp);
                Ok((
                    percentile_of_sorted(&samples, lower_q)?,
                    percentile_of_sorted(&samples, upper_q)?,
                ))
            })
            .collect()
    }

    fn sample_future_changes(
        &self,
        rng: &mut StdRng,
        t_max: f64,
        change_rate: f64,
        laplace_scale: f64,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let poisson = Poisson::new(change_rate * (t_max - 1.0)).map_err(|e| {
            ForecastError::InvalidParameter(format!("Invalid changepoint rate: {}", e))
        })?;
        let n_changes = poisson.sample(rng) as usize;

        let locations = (0..n_changes).map(|_| rng.gen_range(1.0..t_max)).collect();
        let deltas = (0..n_changes)
            .map(|_| {
                let u: f64 = rng.gen_range(-0.5..0.5);
                let tail = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
                -laplace_scale * u.signum() * tail.ln()
            })
            .collect();
        Ok((locations, deltas))
    }
}
