use approx::assert_abs_diff_eq;
use lorenz_mle::dynamics::LorenzDynamics;
use lorenz_mle::linalg::{DMatrix, DVector, Vector3};
use lorenz_mle::noise::WhiteNoise;
use lorenz_mle::od::prelude::*;
use lorenz_mle::trajectory::TrajectoryGenerator;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use rstest::*;

use super::{randn, randn_mat, random_spd};

#[fixture]
fn rng() -> Pcg64Mcg {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    Pcg64Mcg::seed_from_u64(11)
}

#[rstest]
fn sequential_equals_stacked(mut rng: Pcg64Mcg) {
    let n = 4;
    let (m1, m2) = (2, 3);
    let prior = Estimate::new(randn(n, &mut rng), random_spd(n, 1.0, &mut rng)).unwrap();

    let h1 = randn_mat(m1, n, &mut rng);
    let h2 = randn_mat(m2, n, &mut rng);
    let r1 = random_spd(m1, 0.5, &mut rng);
    let r2 = random_spd(m2, 0.5, &mut rng);
    let y1 = randn(m1, &mut rng);
    let y2 = randn(m2, &mut rng);

    let kf = LinearUpdate::default();

    // Process both measurements one after the other, the posterior of the first is the prior of the second.
    let msr1 = LinearMeasurement::new(y1.clone(), h1.clone(), r1.clone()).unwrap();
    let msr2 = LinearMeasurement::new(y2.clone(), h2.clone(), r2.clone()).unwrap();
    let (est1, _) = kf.measurement_update(&prior, &msr1).unwrap();
    let (est2, _) = kf.measurement_update(&est1, &msr2).unwrap();

    // Process both measurements at once, their noises being independent.
    let mut h = DMatrix::zeros(m1 + m2, n);
    h.rows_mut(0, m1).copy_from(&h1);
    h.rows_mut(m1, m2).copy_from(&h2);
    let mut r = DMatrix::zeros(m1 + m2, m1 + m2);
    r.view_mut((0, 0), (m1, m1)).copy_from(&r1);
    r.view_mut((m1, m1), (m2, m2)).copy_from(&r2);
    let mut y = DVector::zeros(m1 + m2);
    y.rows_mut(0, m1).copy_from(&y1);
    y.rows_mut(m1, m2).copy_from(&y2);

    let (mean, covar) = kf.update(&prior.mean, &prior.covar, &y, &h, &r).unwrap();

    assert_abs_diff_eq!(est2.mean, mean, epsilon = 1e-10);
    assert_abs_diff_eq!(est2.covar, covar, epsilon = 1e-10);
}

#[rstest]
fn filter_noisy_lorenz(mut rng: Pcg64Mcg) {
    // Generate noisy observations of the full state of a Lorenz trajectory, and estimate each state
    // independently from a broad prior centered on the observation of the previous time step.
    let sigma = 0.5;
    let gen = TrajectoryGenerator::dopri5(LorenzDynamics::default());
    let x0 = Vector3::new(1.0, 1.0, 1.0);
    let truth = gen.integrate(x0, 0.0, 2.0, 0.01).unwrap();
    let noisy = truth.with_noise(&mut WhiteNoise::new(sigma), &mut rng);

    let kf = LinearUpdate::default();
    let mut prior = Estimate::from_diag(
        noisy.states[0].as_dvector(),
        &DVector::from_element(3, 100.0),
    )
    .unwrap();

    let mut cnt_within = 0;
    for (obs, true_state) in noisy.iter().zip(truth.iter()).skip(1) {
        let msr = LinearMeasurement::with_noise(
            obs.as_dvector(),
            DMatrix::identity(3, 3),
            &WhiteNoise::new(sigma),
            obs.epoch,
        )
        .unwrap();
        let (post, resid) = kf.measurement_update(&prior, &msr).unwrap();
        assert!(resid.ratio >= 0.0);
        // The posterior is tighter than both the prior and the measurement.
        for i in 0..3 {
            assert!(post.covar[(i, i)] < sigma * sigma);
        }
        if post.within_3sigma(&true_state.as_dvector()) {
            cnt_within += 1;
        }
        // Reset the prior as the latest observation with a large uncertainty, the dynamics are chaotic.
        prior = Estimate::from_diag(post.mean, &DVector::from_element(3, 100.0)).unwrap();
    }

    let total = noisy.len() - 1;
    println!("{cnt_within} of {total} estimates within 3 sigma");
    assert!(cnt_within as f64 >= 0.95 * total as f64);
}
