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

/*! # lorenz-mle

Linear Bayesian (Kalman-style) measurement updates, and the Lorenz trajectory generator used to
produce synthetic observations for them.

The core of this crate is [`od::update`]: it fuses a prior estimate with a noisy linear measurement
and returns the posterior mean and covariance. The posterior may be fed back as the next prior.

The [`trajectory::TrajectoryGenerator`] integrates any [`dynamics::Dynamics`] (e.g. the
[`dynamics::LorenzDynamics`]) with one of the embedded Runge Kutta methods of [`propagators`], and
can perturb the samples with seeded Gaussian noise to emulate imperfect sensing.
*/

/// Provides all the propagators / integrators available in this crate.
pub mod propagators;

/// Provides the vector fields which can be integrated, including the Lorenz system.
pub mod dynamics;

/// Trajectories as produced by the propagators, and the trajectory generator.
pub mod trajectory;

/// Stochastic noise models used to emulate imperfect observations.
pub mod noise;

/// Configuration loading from YAML files.
pub mod io;

/// The linear Bayesian update and its supporting types (estimates, measurements, residuals).
pub mod od;

/// Utility functions shared by different modules, mostly matrix checks.
pub mod utils;

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

pub use self::od::{update, ODError};
