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

use super::error_ctrl::ErrorCtrl;
use super::{DynamicsSnafu, IntegrationDetails, PropagationError, Propagator};
use crate::dynamics::Dynamics;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OVector};
use crate::trajectory::{Sample, Traj};
use snafu::ResultExt;
use std::sync::mpsc::{channel, Sender};

/// A propagator instance holds the state being propagated, the integration details of the previous
/// step, and the adapted step size for the next call.
#[derive(Debug)]
pub struct PropInstance<'a, D: Dynamics, E: ErrorCtrl>
where
    DefaultAllocator: Allocator<D::StateSize>,
{
    /// The state of this propagator instance
    pub state: OVector<f64, D::StateSize>,
    /// The time of the state of this propagator instance
    pub epoch: f64,
    /// The propagator setup (kind, stages, etc.)
    pub prop: &'a Propagator<D, E>,
    /// Stores the details of the previous integration step
    pub details: IntegrationDetails,
    pub(crate) step_size: f64, // Stores the adapted step for the _next_ call
    pub(crate) fixed_step: bool,
    // Allows us to do pre-allocation of the ki vectors
    pub(crate) k: Vec<OVector<f64, D::StateSize>>,
}

impl<D: Dynamics, E: ErrorCtrl> PropInstance<'_, D, E>
where
    DefaultAllocator: Allocator<D::StateSize>,
{
    /// Allows setting the step size of the propagator
    pub fn set_step(&mut self, step_size: f64, fixed: bool) {
        self.step_size = step_size;
        self.fixed_step = fixed;
    }

    fn for_duration_channel_option(
        &mut self,
        duration: f64,
        maybe_tx_chan: Option<Sender<Sample<D::StateSize>>>,
    ) -> Result<OVector<f64, D::StateSize>, PropagationError> {
        if !duration.is_finite() {
            return Err(PropagationError::InvalidSpan {
                start: self.epoch,
                end: self.epoch + duration,
            });
        }
        if duration == 0.0 {
            return Ok(self.state.clone());
        }
        if !self.step_size.is_finite() || self.step_size == 0.0 {
            return Err(PropagationError::InvalidStep {
                step: self.step_size,
            });
        }
        let stop_time = self.epoch + duration;
        trace!("Propagating for {duration} until {stop_time}");

        // Call `finally` on the current state to set anything up
        self.state = self
            .prop
            .dynamics
            .finally(self.state.clone())
            .context(DynamicsSnafu)?;

        let backprop = duration < 0.0;
        if backprop {
            self.step_size = -self.step_size.abs(); // Invert the step size
        } else {
            self.step_size = self.step_size.abs();
        }
        loop {
            let epoch = self.epoch;
            if (!backprop && epoch + self.step_size > stop_time)
                || (backprop && epoch + self.step_size <= stop_time)
            {
                if stop_time == epoch {
                    // No propagation necessary
                    if backprop {
                        self.step_size = -self.step_size;
                    }
                    return Ok(self.state.clone());
                }
                // Take one final step of exactly the needed duration until the stop time
                let prev_step_size = self.step_size;
                let prev_step_kind = self.fixed_step;
                self.set_step(stop_time - epoch, true);

                self.single_step()?;
                // Land exactly on the stop time, regardless of the rounding of the final step
                self.epoch = stop_time;

                // Publish to channel if provided
                if let Some(ref chan) = maybe_tx_chan {
                    if let Err(e) = chan.send(self.sample()) {
                        warn!("{} when sending on channel", e)
                    }
                }

                // Restore the step size for subsequent calls
                self.set_step(prev_step_size, prev_step_kind);

                if backprop {
                    self.step_size = -self.step_size; // Restore to a positive step size
                }

                return Ok(self.state.clone());
            } else {
                self.single_step()?;
                // Publish to channel if provided
                if let Some(ref chan) = maybe_tx_chan {
                    if let Err(e) = chan.send(self.sample()) {
                        warn!("{} when sending on channel", e)
                    }
                }
            }
        }
    }

    /// Returns the current state and time as a trajectory sample.
    pub fn sample(&self) -> Sample<D::StateSize> {
        Sample {
            epoch: self.epoch,
            state: self.state.clone(),
        }
    }

    /// This method propagates the provided Dynamics for the provided duration.
    pub fn for_duration(
        &mut self,
        duration: f64,
    ) -> Result<OVector<f64, D::StateSize>, PropagationError> {
        self.for_duration_channel_option(duration, None)
    }

    /// This method propagates the provided Dynamics for the provided duration and publishes each state on the channel.
    pub fn for_duration_with_channel(
        &mut self,
        duration: f64,
        tx_chan: Sender<Sample<D::StateSize>>,
    ) -> Result<OVector<f64, D::StateSize>, PropagationError> {
        self.for_duration_channel_option(duration, Some(tx_chan))
    }

    /// Propagates the provided Dynamics until the provided time. Returns the end state.
    pub fn until_epoch(
        &mut self,
        end_time: f64,
    ) -> Result<OVector<f64, D::StateSize>, PropagationError> {
        let duration = end_time - self.epoch;
        self.for_duration(duration)
    }

    /// Propagates the provided Dynamics for the provided duration and returns the end state and the
    /// trajectory of every integration step taken, including the initial state.
    pub fn for_duration_with_traj(
        &mut self,
        duration: f64,
    ) -> Result<(OVector<f64, D::StateSize>, Traj<D::StateSize>), PropagationError> {
        let start = self.sample();
        let end_state;

        let rx = {
            // Channels that have a single state for the propagator
            let (tx, rx) = channel();
            // Propagate the dynamics
            // Note that the end state is also sent on the channel before the return of this function.
            end_state = self.for_duration_with_channel(duration, tx)?;
            rx
        };

        let mut traj = Traj::new();
        traj.states.push(start);
        traj.states.extend(rx);
        traj.finalize();

        Ok((end_state, traj))
    }

    /// Propagates the provided Dynamics until the provided time and returns the end state and the
    /// trajectory of every integration step taken.
    pub fn until_epoch_with_traj(
        &mut self,
        end_time: f64,
    ) -> Result<(OVector<f64, D::StateSize>, Traj<D::StateSize>), PropagationError> {
        let duration = end_time - self.epoch;
        self.for_duration_with_traj(duration)
    }

    /// Take a single propagator step
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        let (t, state_vec) = self.derive()?;
        self.epoch += t;
        self.state = self
            .prop
            .dynamics
            .finally(state_vec)
            .context(DynamicsSnafu)?;

        Ok(())
    }

    /// This method integrates whichever function is provided as `d_xdt`.
    ///
    /// This function returns the step sized used and the new state as y_{n+1} = y_n + \frac{dy_n}{dt}.
    /// To get the integration details, check `self.latest_details`.
    fn derive(&mut self) -> Result<(f64, OVector<f64, D::StateSize>), PropagationError> {
        let state_vec = &self.state;
        let epoch = self.epoch;
        // Reset the number of attempts used (we don't reset the error because it's set before it's read)
        self.details.attempts = 1;
        // The step size is mutable because we may change it below
        let mut step_size = self.step_size;
        loop {
            let ki = self
                .prop
                .dynamics
                .eom(epoch, state_vec)
                .context(DynamicsSnafu)?;
            self.k[0] = ki;
            let mut a_idx: usize = 0;
            for i in 0..(self.prop.stages - 1) {
                // Let's compute the c_i by summing the relevant items from the list of coefficients.
                // \sum_{j=1}^{i-1} a_ij  ∀ i ∈ [2, s]
                let mut ci: f64 = 0.0;
                // The wi stores the a_{s1} * k_1 + a_{s2} * k_2 + ... + a_{s, s-1} * k_{s-1} +
                let mut wi = OVector::<f64, D::StateSize>::from_element(0.0);
                for kj in &self.k[0..i + 1] {
                    let a_ij = self.prop.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }

                let ki = self
                    .prop
                    .dynamics
                    .eom(epoch + ci * step_size, &(state_vec + step_size * wi))
                    .context(DynamicsSnafu)?;
                self.k[i + 1] = ki;
            }
            // Compute the next state and the error
            let mut next_state = state_vec.clone();
            // State error estimation from https://en.wikipedia.org/wiki/Runge%E2%80%93Kutta_methods#Adaptive_Runge%E2%80%93Kutta_methods
            // This is consistent with GMAT https://github.com/ChristopherRabotin/GMAT/blob/37201a6290e7f7b941bc98ee973a527a5857104b/src/base/propagator/RungeKutta.cpp#L537
            let mut error_est = OVector::<f64, D::StateSize>::from_element(0.0);
            for (i, ki) in self.k.iter().enumerate() {
                let b_i = self.prop.b_coeffs[i];
                if !self.fixed_step {
                    let b_i_star = self.prop.b_coeffs[i + self.prop.stages];
                    error_est += step_size * (b_i - b_i_star) * ki;
                }
                next_state += step_size * b_i * ki;
            }

            if self.fixed_step {
                // Using a fixed step, no adaptive step necessary
                self.details.step = self.step_size;
                return Ok((self.details.step, next_state));
            } else {
                // Compute the error estimate.
                self.details.error = E::estimate(&error_est, &next_state, state_vec);
                if self.details.error <= self.prop.opts.tolerance
                    || step_size.abs() <= self.prop.opts.min_step
                    || self.details.attempts >= self.prop.opts.attempts
                {
                    if self.details.attempts >= self.prop.opts.attempts {
                        warn!(
                            "Could not further decrease step size: maximum number of attempts reached ({})",
                            self.details.attempts
                        );
                    }

                    self.details.step = step_size;
                    if self.details.error < self.prop.opts.tolerance {
                        // Let's increase the step size for the next iteration.
                        // Error is less than tolerance, let's attempt to increase the step for the next iteration.
                        let proposed_step = if self.details.error > 0.0 {
                            0.9 * step_size
                                * (self.prop.opts.tolerance / self.details.error)
                                    .powf(1.0 / f64::from(self.prop.order))
                        } else {
                            self.prop.opts.max_step.copysign(step_size)
                        };
                        step_size = if proposed_step.abs() > self.prop.opts.max_step {
                            self.prop.opts.max_step.copysign(step_size)
                        } else {
                            proposed_step
                        };
                    }
                    // In all cases, let's update the step size to whatever was the adapted step size
                    self.step_size = step_size;
                    return Ok((self.details.step, next_state));
                } else {
                    // Error is too high and we aren't using the smallest step, and we haven't hit the max number of attempts.
                    // So let's adapt the step size.
                    self.details.attempts += 1;
                    let proposed_step = 0.9
                        * step_size
                        * (self.prop.opts.tolerance / self.details.error)
                            .powf(1.0 / f64::from(self.prop.order - 1));
                    step_size = if proposed_step.abs() < self.prop.opts.min_step {
                        self.prop.opts.min_step.copysign(step_size)
                    } else {
                        proposed_step
                    };
                    // Note that we don't set self.step_size, that will be updated right before we return
                }
            }
        }
    }

    /// Copy the details of the latest integration step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}
