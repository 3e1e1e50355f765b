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

use super::{
    check_shape, Estimate, LinearMeasurement, NonFiniteInputSnafu, ODConfigSnafu, ODError,
    Residual,
};
use crate::io::{ConfigError, ConfigRepr};
use crate::linalg::allocator::Allocator;
use crate::linalg::{DMatrix, DVector, DefaultAllocator, Dim, Dyn, OMatrix};
use crate::utils::{is_positive_semi_definite, is_symmetric, min_eigenvalue, rcond, symmetrize};
use na::linalg::{Cholesky, LU};
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;
use std::path::Path;
use typed_builder::TypedBuilder;

fn default_singular_tolerance() -> f64 {
    1e-12
}

fn default_covariance_tolerance() -> f64 {
    1e-9
}

fn default_validate_covariances() -> bool {
    true
}

/// Configuration of the linear update.
#[derive(Copy, Clone, Debug, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
pub struct UpdateConfig {
    /// The update fails if the reciprocal condition number of the innovation covariance is below this value.
    #[builder(default = default_singular_tolerance())]
    #[serde(default = "default_singular_tolerance")]
    pub singular_tolerance: f64,
    /// Relative tolerance used to check the symmetry and the positive semi-definiteness of the input covariances.
    #[builder(default = default_covariance_tolerance())]
    #[serde(default = "default_covariance_tolerance")]
    pub covariance_tolerance: f64,
    /// Set to false to skip the validation of the input covariances.
    #[builder(default = default_validate_covariances())]
    #[serde(default = "default_validate_covariances")]
    pub validate_covariances: bool,
}

impl UpdateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, tol) in [
            ("singular_tolerance", self.singular_tolerance),
            ("covariance_tolerance", self.covariance_tolerance),
        ] {
            if !tol.is_finite() || tol < 0.0 {
                return Err(ConfigError::InvalidConfig {
                    msg: format!("{name} must be a finite non-negative number but is {tol}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Display for UpdateConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[singular tol.: {:e}; covariance tol.: {:e}; validate covariances: {}]",
            self.singular_tolerance, self.covariance_tolerance, self.validate_covariances
        )
    }
}

impl ConfigRepr for UpdateConfig {}

/// The factorization of the innovation covariance, computed once and reused for every solve of an update.
enum InnovationSolver {
    Cholesky(Cholesky<f64, Dyn>),
    Lu(LU<f64, Dyn, Dyn>),
}

impl InnovationSolver {
    /// Uses a Cholesky factorization if the innovation covariance is positive definite, else an LU with partial pivoting.
    fn factor(innovation: DMatrix<f64>) -> Self {
        match innovation.clone().cholesky() {
            Some(chol) => Self::Cholesky(chol),
            None => {
                warn!("innovation covariance is not positive definite, using an LU factorization");
                Self::Lu(innovation.lu())
            }
        }
    }

    /// Solves `L X = B`, returns None if the factorization is singular.
    fn solve<C: Dim>(&self, b: &OMatrix<f64, Dyn, C>) -> Option<OMatrix<f64, Dyn, C>>
    where
        DefaultAllocator: Allocator<Dyn, C>,
    {
        match self {
            Self::Cholesky(chol) => Some(chol.solve(b)),
            Self::Lu(lu) => lu.solve(b),
        }
    }
}

/// The full result of an update, of which the public functions return the relevant parts.
struct Fused {
    mean: DVector<f64>,
    covar: DMatrix<f64>,
    prefit: DVector<f64>,
    innovation: DMatrix<f64>,
    ratio: f64,
}

/// Fuses a prior estimate with a linear measurement, i.e. the measurement update of a Kalman filter.
///
/// Given the prior `x ~ N(x̄, P)` and the measurement `y = H x + v` with `v ~ N(0, R)`, the posterior is computed as:
/// ```text
/// MC = H P
/// L  = MC Hᵗ + R
/// x⁺ = x̄ + MCᵗ L⁻¹ (y - H x̄)
/// P⁺ = P - MCᵗ L⁻¹ MC
/// ```
/// where `L⁻¹` is never formed: both products are solves on the same factorization of `L`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LinearUpdate {
    pub cfg: UpdateConfig,
}

impl LinearUpdate {
    pub fn new(cfg: UpdateConfig) -> Self {
        Self { cfg }
    }

    /// Initializes the update from the configuration stored in the provided YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ODError> {
        let cfg = UpdateConfig::load(path).context(ODConfigSnafu)?;
        cfg.validate().context(ODConfigSnafu)?;
        Ok(Self::new(cfg))
    }

    /// Computes the posterior mean and covariance from the prior mean and covariance, the measurement,
    /// the measurement operator, and the measurement noise covariance.
    ///
    /// # Errors
    /// + `DimensionMismatch` if any of the shapes are inconsistent, checked before any computation;
    /// + `NonFiniteInput` if any input contains a NaN or an infinity;
    /// + `InvalidCovariance` if a covariance is asymmetric or not positive semi-definite (unless disabled in the configuration);
    /// + `SingularSystem` if the innovation covariance is (numerically) singular;
    /// + `NonFiniteResult` if the solve produced non finite values.
    pub fn update(
        &self,
        prior_mean: &DVector<f64>,
        prior_covar: &DMatrix<f64>,
        measurement: &DVector<f64>,
        operator: &DMatrix<f64>,
        noise_covar: &DMatrix<f64>,
    ) -> Result<(DVector<f64>, DMatrix<f64>), ODError> {
        let fused = self.fuse(prior_mean, prior_covar, measurement, operator, noise_covar)?;
        Ok((fused.mean, fused.covar))
    }

    /// Computes the posterior estimate of the provided prior after processing the provided measurement,
    /// and returns it with the residuals of this measurement.
    ///
    /// The returned estimate may be used as the prior of the next measurement update.
    pub fn measurement_update(
        &self,
        prior: &Estimate,
        msr: &LinearMeasurement,
    ) -> Result<(Estimate, Residual), ODError> {
        let fused = self.fuse(
            &prior.mean,
            &prior.covar,
            &msr.observation,
            &msr.operator,
            &msr.noise_covar,
        )?;

        let postfit = &msr.observation - &msr.operator * &fused.mean;
        let residual = Residual {
            postfit,
            ratio: fused.ratio,
            innovation_sigmas: fused.innovation.diagonal().map(|v| v.max(0.0).sqrt()),
            prefit: fused.prefit,
        };
        trace!("{residual}");

        let estimate = Estimate {
            mean: fused.mean,
            covar: fused.covar,
        };

        Ok((estimate, residual))
    }

    fn check_inputs(
        &self,
        prior_mean: &DVector<f64>,
        prior_covar: &DMatrix<f64>,
        measurement: &DVector<f64>,
        operator: &DMatrix<f64>,
        noise_covar: &DMatrix<f64>,
    ) -> Result<(), ODError> {
        let n = prior_mean.len();
        let m = measurement.len();
        check_shape("prior mean", (n, 1), (n.max(1), 1))?;
        check_shape("prior covariance", prior_covar.shape(), (n, n))?;
        check_shape("measurement", (m, 1), (m.max(1), 1))?;
        check_shape("measurement operator", operator.shape(), (m, n))?;
        check_shape("measurement noise covariance", noise_covar.shape(), (m, m))?;

        ensure!(
            prior_mean.iter().all(|v| v.is_finite()),
            NonFiniteInputSnafu { which: "prior mean" }
        );
        ensure!(
            prior_covar.iter().all(|v| v.is_finite()),
            NonFiniteInputSnafu {
                which: "prior covariance"
            }
        );
        ensure!(
            measurement.iter().all(|v| v.is_finite()),
            NonFiniteInputSnafu {
                which: "measurement"
            }
        );
        ensure!(
            operator.iter().all(|v| v.is_finite()),
            NonFiniteInputSnafu {
                which: "measurement operator"
            }
        );
        ensure!(
            noise_covar.iter().all(|v| v.is_finite()),
            NonFiniteInputSnafu {
                which: "measurement noise covariance"
            }
        );

        if self.cfg.validate_covariances {
            self.check_covariance("prior covariance", prior_covar)?;
            self.check_covariance("measurement noise covariance", noise_covar)?;
        }

        Ok(())
    }

    fn check_covariance(&self, which: &'static str, covar: &DMatrix<f64>) -> Result<(), ODError> {
        let tol = self.cfg.covariance_tolerance;
        if !is_symmetric(covar, tol) {
            return Err(ODError::InvalidCovariance {
                which,
                reason: "not symmetric".to_string(),
            });
        }
        if !is_positive_semi_definite(covar, tol) {
            return Err(ODError::InvalidCovariance {
                which,
                reason: format!(
                    "not positive semi-definite (smallest eigenvalue is {:e})",
                    min_eigenvalue(covar)
                ),
            });
        }
        Ok(())
    }

    fn fuse(
        &self,
        prior_mean: &DVector<f64>,
        prior_covar: &DMatrix<f64>,
        measurement: &DVector<f64>,
        operator: &DMatrix<f64>,
        noise_covar: &DMatrix<f64>,
    ) -> Result<Fused, ODError> {
        self.check_inputs(prior_mean, prior_covar, measurement, operator, noise_covar)?;
        debug!(
            "measurement update of {} states with {} measurements",
            prior_mean.len(),
            measurement.len()
        );

        // Project the prior covariance into the measurement space.
        let mc = operator * prior_covar;
        // Compute the innovation covariance.
        let innovation = &mc * operator.transpose() + noise_covar;
        // Compute the prefit residual, i.e. the innovation.
        let prefit = measurement - operator * prior_mean;

        // Finite inputs may still overflow.
        if !mc
            .iter()
            .chain(innovation.iter())
            .chain(prefit.iter())
            .all(|v| v.is_finite())
        {
            return Err(ODError::NonFiniteResult);
        }

        let rcond = rcond(&innovation);
        trace!("innovation covariance reciprocal condition number: {rcond:e}");
        // Written so that a NaN condition number is also rejected.
        if !(rcond >= self.cfg.singular_tolerance) || rcond == 0.0 {
            return Err(ODError::SingularSystem {
                rcond,
                tolerance: self.cfg.singular_tolerance,
            });
        }

        let singular = || ODError::SingularSystem {
            rcond,
            tolerance: self.cfg.singular_tolerance,
        };
        let solver = InnovationSolver::factor(innovation.clone());
        let z = solver.solve(&prefit).ok_or_else(singular)?;
        let w = solver.solve(&mc).ok_or_else(singular)?;

        let mean = prior_mean + mc.tr_mul(&z);
        let covar = symmetrize(&(prior_covar - mc.tr_mul(&w)));
        let ratio = prefit.dot(&z);

        if !mean.iter().chain(covar.iter()).all(|v| v.is_finite()) {
            return Err(ODError::NonFiniteResult);
        }

        Ok(Fused {
            mean,
            covar,
            prefit,
            innovation,
            ratio,
        })
    }
}

/// Computes the linear Bayesian update of the prior mean and covariance with the provided measurement, using the default configuration.
///
/// Refer to `LinearUpdate::update` for details.
pub fn update(
    prior_mean: &DVector<f64>,
    prior_covar: &DMatrix<f64>,
    measurement: &DVector<f64>,
    operator: &DMatrix<f64>,
    noise_covar: &DMatrix<f64>,
) -> Result<(DVector<f64>, DMatrix<f64>), ODError> {
    LinearUpdate::default().update(prior_mean, prior_covar, measurement, operator, noise_covar)
}
