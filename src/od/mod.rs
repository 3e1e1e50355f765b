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

use crate::io::ConfigError;
use snafu::prelude::*;

/// Provides the Estimate, i.e. the mean and covariance pair which flows through successive updates.
pub mod estimate;
pub use estimate::Estimate;

/// Provides linear measurements, i.e. an observation, its operator, and its noise.
pub mod measurement;
pub use measurement::LinearMeasurement;

pub mod residual;
pub use residual::Residual;

/// Provides the linear Bayesian measurement update.
mod update;
pub use update::{update, LinearUpdate, UpdateConfig};

#[allow(unused_imports)]
pub mod prelude {
    pub use super::estimate::*;
    pub use super::measurement::*;
    pub use super::residual::*;
    pub use super::*;
    pub use crate::noise::{Stochastics, WhiteNoise};
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ODError {
    #[snafu(display(
        "{what} must be {}x{} but is {}x{}",
        expected.0,
        expected.1,
        found.0,
        found.1
    ))]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[snafu(display(
        "innovation covariance is singular: reciprocal condition number {rcond:e} below {tolerance:e}"
    ))]
    SingularSystem { rcond: f64, tolerance: f64 },
    #[snafu(display("{which} is not a valid covariance: {reason}"))]
    InvalidCovariance { which: &'static str, reason: String },
    #[snafu(display("{which} contains non finite values"))]
    NonFiniteInput { which: &'static str },
    #[snafu(display("measurement update produced non finite values"))]
    NonFiniteResult,
    #[snafu(display("update failed because {source}"))]
    ODConfigError { source: ConfigError },
}

/// Returns an error if the provided matrix is not of the expected shape.
pub(crate) fn check_shape(
    what: &'static str,
    found: (usize, usize),
    expected: (usize, usize),
) -> Result<(), ODError> {
    ensure!(
        found == expected,
        DimensionMismatchSnafu {
            what,
            expected,
            found
        }
    );
    Ok(())
}
