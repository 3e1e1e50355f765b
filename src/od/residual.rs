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

use crate::linalg::DVector;
use std::fmt;

/// Stores the residuals of a `measurement_update`.
#[derive(Debug, Clone, PartialEq)]
pub struct Residual {
    /// The prefit residual, i.e. the innovation `y - H x` computed with the prior mean
    pub prefit: DVector<f64>,
    /// The postfit residual, i.e. `y - H x⁺` computed with the posterior mean
    pub postfit: DVector<f64>,
    /// The prefit residual ratio computed as the Mahalanobis distance, i.e. it is always positive
    /// and computed as `r' * (H*P*H' + R)^-1 * r`, where `r` is the prefit residual.
    /// To assess the performance, look at the Chi Square distribution for the number of measurements.
    pub ratio: f64,
    /// The one-sigma of each component of the innovation, i.e. the square root of the diagonal of `H*P*H' + R`
    pub innovation_sigmas: DVector<f64>,
}

impl Residual {
    /// Returns whether each prefit residual is within `n_sigmas` of its innovation one-sigma.
    pub fn within_sigmas(&self, n_sigmas: f64) -> bool {
        self.prefit
            .iter()
            .zip(self.innovation_sigmas.iter())
            .all(|(r, sigma)| r.abs() <= n_sigmas * sigma)
    }
}

impl fmt::Display for Residual {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Residual ratio = {:.3}\tPrefit = {}\tPostfit = {}",
            self.ratio,
            self.prefit.transpose(),
            self.postfit.transpose()
        )
    }
}
