use lorenz_mle::dynamics::{Dynamics, DynamicsError};
use lorenz_mle::linalg::{Const, Vector2};

mod lorenz;
mod propagators;

/// The undamped harmonic oscillator, x'' = -ω² x, whose solution is known in closed form.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HarmonicOscillator {
    pub omega: f64,
}

impl HarmonicOscillator {
    /// Returns the exact state at time t when starting from x = 1 and x' = 0 at t = 0.
    pub fn exact(&self, t: f64) -> Vector2<f64> {
        Vector2::new(
            (self.omega * t).cos(),
            -self.omega * (self.omega * t).sin(),
        )
    }
}

impl Dynamics for HarmonicOscillator {
    type StateSize = Const<2>;

    fn eom(&self, _t: f64, state: &Vector2<f64>) -> Result<Vector2<f64>, DynamicsError> {
        Ok(Vector2::new(state[1], -self.omega.powi(2) * state[0]))
    }
}
