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
use std::fmt;

/// Stores an Estimate, i.e. a state mean and its covariance, as the input or the result of a `measurement_update`.
///
/// The posterior estimate of an update can be used as the prior of the next one without modification.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    /// The mean of the state, of length n
    pub mean: DVector<f64>,
    /// The covariance of the state, n x n
    pub covar: DMatrix<f64>,
}

impl Estimate {
    /// Initializes a new estimate, checking that the dimensions of the mean and the covariance match.
    pub fn new(mean: DVector<f64>, covar: DMatrix<f64>) -> Result<Self, ODError> {
        let n = mean.len();
        check_shape("state mean", (n, 1), (n.max(1), 1))?;
        check_shape("state covariance", covar.shape(), (n, n))?;
        Ok(Self { mean, covar })
    }

    /// Initializes a new estimate whose covariance is diagonal, built from the provided variances.
    pub fn from_diag(mean: DVector<f64>, diag: &DVector<f64>) -> Result<Self, ODError> {
        Self::new(mean, DMatrix::from_diagonal(diag))
    }

    /// Number of states in this estimate
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Returns the one-sigma of each state, i.e. the square root of the diagonal of the covariance.
    pub fn sigmas(&self) -> DVector<f64> {
        self.covar.diagonal().map(|v| v.max(0.0).sqrt())
    }

    /// Returns whether the provided truth is within `n_sigmas` of the mean on every state.
    pub fn within_sigmas(&self, truth: &DVector<f64>, n_sigmas: f64) -> bool {
        truth.len() == self.dim()
            && (truth - &self.mean)
                .iter()
                .zip(self.sigmas().iter())
                .all(|(err, sigma)| err.abs() <= n_sigmas * sigma)
    }

    /// Returns whether the provided truth is within the 3 sigma bounds of this estimate.
    pub fn within_3sigma(&self, truth: &DVector<f64>) -> bool {
        self.within_sigmas(truth, 3.0)
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fmt_sigmas = self
            .sigmas()
            .iter()
            .map(|s| format!("{s:e}"))
            .collect::<Vec<String>>();
        write!(
            f,
            "=== Estimate of {} states ===\nmean {}\nsigmas [{}]\n",
            self.dim(),
            self.mean.transpose(),
            fmt_sigmas.join(",")
        )
    }
}
