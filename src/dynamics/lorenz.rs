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

use super::{Dynamics, DynamicsError};
use crate::io::ConfigRepr;
use crate::linalg::{Const, Vector3};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The Lorenz system, three coupled nonlinear ODEs:
///
/// ```text
/// dx/dt = σ (y - x)
/// dy/dt = x (ρ - z) - y
/// dz/dt = x y - β z
/// ```
///
/// The default parameters are those of the classical chaotic regime, σ = 10, ρ = 28, β = 8/3.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LorenzDynamics {
    #[serde(default = "LorenzDynamics::default_sigma")]
    pub sigma: f64,
    #[serde(default = "LorenzDynamics::default_rho")]
    pub rho: f64,
    #[serde(default = "LorenzDynamics::default_beta")]
    pub beta: f64,
}

impl LorenzDynamics {
    pub fn new(sigma: f64, rho: f64, beta: f64) -> Self {
        Self { sigma, rho, beta }
    }

    /// The classical chaotic parameters.
    pub fn classic() -> Self {
        Self::default()
    }

    fn default_sigma() -> f64 {
        10.0
    }

    fn default_rho() -> f64 {
        28.0
    }

    fn default_beta() -> f64 {
        8.0 / 3.0
    }

    /// Returns the three fixed points of the system. The first one is the origin, the two others only
    /// exist (as real points) when rho > 1, otherwise they are NaN.
    pub fn fixed_points(&self) -> [Vector3<f64>; 3] {
        let c = (self.beta * (self.rho - 1.0)).sqrt();
        [
            Vector3::zeros(),
            Vector3::new(c, c, self.rho - 1.0),
            Vector3::new(-c, -c, self.rho - 1.0),
        ]
    }
}

impl Default for LorenzDynamics {
    fn default() -> Self {
        Self {
            sigma: Self::default_sigma(),
            rho: Self::default_rho(),
            beta: Self::default_beta(),
        }
    }
}

impl fmt::Display for LorenzDynamics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Lorenz (sigma = {}, rho = {}, beta = {:.6})",
            self.sigma, self.rho, self.beta
        )
    }
}

impl ConfigRepr for LorenzDynamics {}

impl Dynamics for LorenzDynamics {
    type StateSize = Const<3>;

    fn eom(&self, t: f64, state: &Vector3<f64>) -> Result<Vector3<f64>, DynamicsError> {
        if state.iter().any(|x| !x.is_finite()) {
            return Err(DynamicsError::NonFiniteState { model: "Lorenz", t });
        }

        let (x, y, z) = (state[0], state[1], state[2]);
        let d_xdt = Vector3::new(
            self.sigma * (y - x),
            x * (self.rho - z) - y,
            x * y - self.beta * z,
        );

        if d_xdt.iter().all(|x| x.is_finite()) {
            Ok(d_xdt)
        } else {
            Err(DynamicsError::NonFiniteDerivative { model: "Lorenz", t })
        }
    }
}
