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

use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, DimName, OVector};
use snafu::Snafu;

/// The Lorenz 1963 system.
pub mod lorenz;
pub use self::lorenz::*;

/// A trait for models with equations of motion that can be integrated.
///
/// The time is in the units of the dynamics themselves (the Lorenz system is non-dimensional).
pub trait Dynamics: Clone + Sync + Send
where
    DefaultAllocator: Allocator<Self::StateSize>,
{
    /// Dimension of the state vector of these dynamics.
    type StateSize: DimName;

    /// Defines the equations of motion.
    ///
    /// - `t`: the time at which the derivative is evaluated.
    /// - `state`: the state vector, which changes at each integration stage.
    fn eom(
        &self,
        t: f64,
        state: &OVector<f64, Self::StateSize>,
    ) -> Result<OVector<f64, Self::StateSize>, DynamicsError>;

    /// Performs final changes after each successful integration step.
    ///
    /// Also called before the first integration step to update the initial state if needed.
    fn finally(
        &self,
        next_state: OVector<f64, Self::StateSize>,
    ) -> Result<OVector<f64, Self::StateSize>, DynamicsError> {
        Ok(next_state)
    }
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// The derivative could not be represented, the integration diverged.
    #[snafu(display("{model} derivative is not finite at t = {t}"))]
    NonFiniteDerivative { model: &'static str, t: f64 },
    /// The state handed to the dynamics is unusable.
    #[snafu(display("{model} cannot evaluate a non-finite state at t = {t}"))]
    NonFiniteState { model: &'static str, t: f64 },
}
