extern crate lorenz_mle;
extern crate log;
extern crate pretty_env_logger as pel;

use log::info;
use lorenz_mle::linalg::{DMatrix, DVector};
use lorenz_mle::od::prelude::*;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64Mcg;
use std::error::Error;
use std::f64::consts::TAU;

fn randn<R: Rng>(n: usize, rng: &mut R) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.sample(StandardNormal))
}

fn main() -> Result<(), Box<dyn Error>> {
    pel::init();
    let mut rng = Pcg64Mcg::seed_from_u64(16);

    // The truth is one period of a sine wave sampled on nn points.
    let nn = 16;
    let truth = DVector::from_fn(nn, |k, _| (TAU * k as f64 / nn as f64).sin());

    // The prior errors are correlated between neighboring points, through a circulant matrix.
    let mut l = DMatrix::zeros(nn, nn);
    for i in 0..nn {
        l[(i, i)] = 1.0;
        l[(i, (i + 1) % nn)] = 0.5;
    }

    let prior_mean = &truth + &l * randn(nn, &mut rng) / 16.0;
    let prior_covar = &l * l.transpose() / 256.0;

    // The measurement operator is a blurring kernel: each measurement averages two neighboring points.
    let m = nn / 2;
    let mut operator = DMatrix::zeros(m, nn);
    for k in 0..m {
        operator[(k, 2 * k)] = 0.5;
        operator[(k, 2 * k + 1)] = 0.5;
    }

    let noise_covar = DMatrix::from_diagonal_element(m, m, 1.0 / 256.0);
    let measurement = &operator * &truth + randn(m, &mut rng) / 16.0;

    let prior = Estimate::new(prior_mean, prior_covar)?;
    let msr = LinearMeasurement::new(measurement, operator, noise_covar)?;

    let (posterior, residual) = LinearUpdate::default().measurement_update(&prior, &msr)?;

    info!("{residual}");
    println!("prior {prior}");
    println!("posterior {posterior}");

    let prior_err = (&prior.mean - &truth).norm();
    let post_err = (&posterior.mean - &truth).norm();
    println!("error norm: prior = {prior_err:.4}, posterior = {post_err:.4}");
    println!(
        "covariance trace: prior = {:.4e}, posterior = {:.4e}",
        prior.covar.trace(),
        posterior.covar.trace()
    );

    Ok(())
}
