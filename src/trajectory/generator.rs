/*
    lorenz-mle, linear Bayesian updates and Lorenz trajectories
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{Sample, Traj};
use crate::dynamics::Dynamics;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OVector};
use crate::noise::Stochastics;
use crate::propagators::{ErrorCtrl, PropOpts, PropagationError, Propagator, RSSStep};
use rand::Rng;

/// Generates trajectories sampled on a regular grid of output times.
///
/// The underlying propagator chooses its own steps (adaptive or fixed, depending on its options) and
/// lands exactly on every output time.
#[derive(Clone, Debug)]
pub struct TrajectoryGenerator<D: Dynamics, E: ErrorCtrl>
where
    DefaultAllocator: Allocator<D::StateSize>,
{
    pub prop: Propagator<D, E>,
}

impl<D: Dynamics> TrajectoryGenerator<D, RSSStep>
where
    DefaultAllocator: Allocator<D::StateSize>,
{
    /// An adaptive Dormand Prince 4-5 generator with the default options.
    pub fn dopri5(dynamics: D) -> Self {
        Self {
            prop: Propagator::default(dynamics),
        }
    }

    /// A generator which integrates with the classical RK4 at a fixed step.
    pub fn rk4_fixed(dynamics: D, step: f64) -> Self {
        Self {
            prop: Propagator::new::<crate::propagators::RK4Fixed>(
                dynamics,
                PropOpts::with_fixed_step(step),
            ),
        }
    }
}

impl<D: Dynamics, E: ErrorCtrl> TrajectoryGenerator<D, E>
where
    DefaultAllocator: Allocator<D::StateSize>,
{
    pub fn new(prop: Propagator<D, E>) -> Self {
        Self { prop }
    }

    /// Integrates the dynamics from `initial_state` at `t0`, and returns one sample every `step` until `t1`.
    ///
    /// The samples are taken at `t0 + k * step` for `k = 1, 2, ...` as long as the previous sample time
    /// is before `t1`. Hence, the initial state is not part of the output, and the last sample may be
    /// up to one step past `t1`. If `t1 == t0`, the trajectory is empty.
    pub fn integrate(
        &self,
        initial_state: OVector<f64, D::StateSize>,
        t0: f64,
        t1: f64,
        step: f64,
    ) -> Result<Traj<D::StateSize>, PropagationError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(PropagationError::InvalidStep { step });
        }
        if !t0.is_finite() || !t1.is_finite() || t1 < t0 {
            return Err(PropagationError::InvalidSpan { start: t0, end: t1 });
        }
        self.prop.opts.validate()?;

        info!(
            "Generating samples every {step} from {t0} to {t1} ({})",
            self.prop.opts
        );

        let mut instance = self.prop.with(initial_state, t0);
        let mut traj = Traj::new();
        let mut k: u64 = 0;
        let mut prev_epoch = t0;
        // Each output time is computed from t0 to prevent any accumulation of rounding errors.
        while t0 + (k as f64) * step < t1 {
            k += 1;
            let epoch = t0 + (k as f64) * step;
            if epoch <= prev_epoch {
                // The step is below the resolution of the epochs.
                return Err(PropagationError::InvalidStep { step });
            }
            prev_epoch = epoch;
            let state = instance.until_epoch(epoch)?;
            traj.states.push(Sample { epoch, state });
        }

        debug!("Generated {traj}");
        Ok(traj)
    }

    /// Same as `integrate` but each component of each sample is perturbed by an independent sample
    /// of the provided noise, drawn from the provided random number generator.
    ///
    /// The noise does not affect the propagation itself, only the returned samples.
    pub fn integrate_with_noise<S: Stochastics, R: Rng>(
        &self,
        initial_state: OVector<f64, D::StateSize>,
        t0: f64,
        t1: f64,
        step: f64,
        noise: &mut S,
        rng: &mut R,
    ) -> Result<Traj<D::StateSize>, PropagationError> {
        let traj = self.integrate(initial_state, t0, t1, step)?;
        Ok(traj.with_noise(noise, rng))
    }
}
