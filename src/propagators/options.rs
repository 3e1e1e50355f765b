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

use std::fmt;

use super::{ErrorCtrl, PropagationError, RSSStep};
use crate::io::ConfigRepr;
use serde_derive::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options, including the minimum and maximum step sizes, and the
/// max error size.
///
/// All steps are expressed in the time unit of the dynamics being integrated.
///
/// Note that different step sizes and max errors are only used for adaptive
/// methods. To use a fixed step integrator, initialize the options using `with_fixed_step`, and
/// use whichever adaptive step integrator is desired.  For example, initializing a Dormand45 with
/// fixed step options will lead to its fifth order solution being used at every step without adaptation.
#[derive(Clone, Copy, Debug, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
#[serde(bound = "E: ErrorCtrl")]
pub struct PropOpts<E: ErrorCtrl> {
    #[builder(default = 0.01)]
    #[serde(default = "default_init_step")]
    pub init_step: f64,
    #[builder(default = 1e-6)]
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    #[builder(default = 0.5)]
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    #[builder(default = 1e-12)]
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[builder(default = 50)]
    #[serde(default = "default_attempts")]
    pub attempts: u8,
    #[builder(default = false)]
    #[serde(default)]
    pub fixed_step: bool,
    #[builder(default)]
    #[serde(default)]
    pub error_ctrl: E,
}

impl<E: ErrorCtrl> PropOpts<E> {
    /// `with_adaptive_step` initializes an `PropOpts` such that the integrator is used with an
    ///  adaptive step size. The number of attempts is currently fixed to 50 (as in GMAT).
    pub fn with_adaptive_step(min_step: f64, max_step: f64, tolerance: f64, error_ctrl: E) -> Self {
        PropOpts {
            init_step: max_step,
            min_step,
            max_step,
            tolerance,
            attempts: 50,
            fixed_step: false,
            error_ctrl,
        }
    }

    /// Set the maximum step size and sets the initial step to that value if currently greater
    pub fn set_max_step(&mut self, max_step: f64) {
        if self.init_step > max_step {
            self.init_step = max_step;
        }
        self.max_step = max_step;
    }

    /// Ensures that the steps are strictly positive, finite, and ordered, and that the tolerance of an
    /// adaptive integrator is positive and finite.
    pub fn validate(&self) -> Result<(), PropagationError> {
        for step in [self.init_step, self.min_step, self.max_step] {
            if !step.is_finite() || step <= 0.0 {
                return Err(PropagationError::InvalidStep { step });
            }
        }
        if self.min_step > self.max_step {
            return Err(PropagationError::InvalidStep {
                step: self.min_step,
            });
        }
        if !self.fixed_step && (!self.tolerance.is_finite() || self.tolerance <= 0.0) {
            return Err(PropagationError::InvalidTolerance {
                tolerance: self.tolerance,
            });
        }
        Ok(())
    }
}

fn default_init_step() -> f64 {
    0.01
}

fn default_min_step() -> f64 {
    1e-6
}

fn default_max_step() -> f64 {
    0.5
}

fn default_tolerance() -> f64 {
    1e-12
}

fn default_attempts() -> u8 {
    50
}

impl<E: ErrorCtrl> fmt::Display for PropOpts<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fixed_step {
            write!(f, "fixed step: {:e}", self.min_step,)
        } else {
            write!(
                f,
                "min_step: {:e}, max_step: {:e}, tol: {:e}, attempts: {}",
                self.min_step, self.max_step, self.tolerance, self.attempts,
            )
        }
    }
}

impl PropOpts<RSSStep> {
    /// `with_fixed_step` initializes an `PropOpts` such that the integrator is used with a fixed
    ///  step size.
    pub fn with_fixed_step(step: f64) -> Self {
        PropOpts {
            init_step: step,
            min_step: step,
            max_step: step,
            tolerance: 0.0,
            fixed_step: true,
            attempts: 0,
            error_ctrl: RSSStep,
        }
    }

    /// Returns the default options with a specific tolerance.
    #[allow(clippy::field_reassign_with_default)]
    pub fn with_tolerance(tolerance: f64) -> Self {
        let mut opts = Self::default();
        opts.tolerance = tolerance;
        opts
    }

    /// Creates a propagator with the provided max step, and sets the initial step to that value as well.
    #[allow(clippy::field_reassign_with_default)]
    pub fn with_max_step(max_step: f64) -> Self {
        let mut opts = Self::default();
        opts.set_max_step(max_step);
        opts
    }
}

impl Default for PropOpts<RSSStep> {
    fn default() -> PropOpts<RSSStep> {
        PropOpts {
            init_step: 0.01,
            min_step: 1e-6,
            max_step: 0.5,
            tolerance: 1e-12,
            attempts: 50,
            fixed_step: false,
            error_ctrl: RSSStep,
        }
    }
}

impl<E: ErrorCtrl> ConfigRepr for PropOpts<E> {}
