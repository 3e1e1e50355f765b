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

use super::{check_shape, ODError};
use crate::linalg::{DMatrix, DVector};
use crate::noise::Stochastics;

/// A linear observation of the state, `y = H x + v` with `v ~ N(0, R)`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearMeasurement {
    /// The observation vector `y`, of length m
    pub observation: DVector<f64>,
    /// The measurement operator `H`, m x n, which maps the state space into the measurement space
    pub operator: DMatrix<f64>,
    /// The measurement noise covariance `R`, m x m
    pub noise_covar: DMatrix<f64>,
}

impl LinearMeasurement {
    /// Initializes a new linear measurement, checking that the dimensions of its components match.
    pub fn new(
        observation: DVector<f64>,
        operator: DMatrix<f64>,
        noise_covar: DMatrix<f64>,
    ) -> Result<Self, ODError> {
        let m = observation.len();
        check_shape("measurement", (m, 1), (m.max(1), 1))?;
        check_shape("measurement operator", (operator.nrows(), 1), (m, 1))?;
        check_shape("measurement noise covariance", noise_covar.shape(), (m, m))?;
        Ok(Self {
            observation,
            operator,
            noise_covar,
        })
    }

    /// Initializes a linear measurement whose components all share the same stochastic noise,
    /// independently from one another. The noise variance is evaluated at the provided epoch.
    pub fn with_noise<S: Stochastics>(
        observation: DVector<f64>,
        operator: DMatrix<f64>,
        noise: &S,
        epoch: f64,
    ) -> Result<Self, ODError> {
        let m = observation.len();
        let noise_covar = DMatrix::from_diagonal_element(m, m, noise.covariance(epoch));
        Self::new(observation, operator, noise_covar)
    }

    /// Initializes a measurement of the full state, i.e. whose operator is the identity.
    pub fn full_state(observation: DVector<f64>, noise_covar: DMatrix<f64>) -> Result<Self, ODError> {
        let n = observation.len();
        Self::new(observation, DMatrix::identity(n, n), noise_covar)
    }

    /// Number of measured quantities, m
    pub fn dim(&self) -> usize {
        self.observation.len()
    }

    /// Number of states this measurement observes, n
    pub fn state_dim(&self) -> usize {
        self.operator.ncols()
    }

    /// Returns the observation predicted by the measurement operator for the provided state, i.e. `H x`.
    pub fn computed_obs(&self, state: &DVector<f64>) -> Result<DVector<f64>, ODError> {
        check_shape("state mean", (state.len(), 1), (self.state_dim(), 1))?;
        Ok(&self.operator * state)
    }
}
