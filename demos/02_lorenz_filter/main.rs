extern crate lorenz_mle;
extern crate log;
extern crate pretty_env_logger as pel;

use log::info;
use lorenz_mle::dynamics::LorenzDynamics;
use lorenz_mle::linalg::{DMatrix, DVector, Vector3};
use lorenz_mle::noise::WhiteNoise;
use lorenz_mle::od::prelude::*;
use lorenz_mle::propagators::{PropOpts, Propagator};
use lorenz_mle::trajectory::TrajectoryGenerator;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    pel::init();

    // Generate the truth with a Dormand Prince 4-5, and sample it every 0.01 time units.
    let lorenz = LorenzDynamics::classic();
    let generator =
        TrajectoryGenerator::new(Propagator::dp45(lorenz, PropOpts::with_tolerance(1e-11)));
    let x0 = Vector3::new(1.0, 1.0, 1.0);
    let truth = generator.integrate(x0, 0.0, 10.0, 0.01)?;
    info!("{truth}");

    // Only the x and z components are observed, with a white noise.
    let sigma = 0.5;
    let mut noise = WhiteNoise::new(sigma);
    let mut rng = Pcg64Mcg::seed_from_u64(1963);
    let observations = truth.with_noise(&mut noise, &mut rng);
    let operator = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);

    let kf = LinearUpdate::default();
    let mut prior = Estimate::from_diag(DVector::zeros(3), &DVector::from_element(3, 400.0))?;
    let mut cnt_within = 0;
    for (k, (obs, true_state)) in observations.iter().zip(truth.iter()).enumerate() {
        let observed = &operator * obs.as_dvector();
        let msr = LinearMeasurement::with_noise(observed, operator.clone(), &noise, obs.epoch)?;
        let (estimate, residual) = kf.measurement_update(&prior, &msr)?;

        if estimate.within_3sigma(&true_state.as_dvector()) {
            cnt_within += 1;
        }
        if k % 100 == 99 {
            println!("t = {:.2}\t{residual}", obs.epoch);
        }

        // The dynamics are chaotic, so the next prior is the current estimate with an inflated covariance.
        let mut covar = estimate.covar;
        for i in 0..3 {
            covar[(i, i)] += 25.0;
        }
        prior = Estimate::new(estimate.mean, covar)?;
    }

    println!(
        "{cnt_within} of {} estimates within 3 sigma of the truth",
        truth.len()
    );

    Ok(())
}
