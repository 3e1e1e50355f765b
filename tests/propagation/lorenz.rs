use approx::assert_abs_diff_eq;
use lorenz_mle::dynamics::LorenzDynamics;
use lorenz_mle::io::ConfigRepr;
use lorenz_mle::linalg::Vector3;
use lorenz_mle::noise::WhiteNoise;
use lorenz_mle::propagators::*;
use lorenz_mle::trajectory::TrajectoryGenerator;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use rstest::*;

#[fixture]
fn generator() -> TrajectoryGenerator<LorenzDynamics, RSSStep> {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    TrajectoryGenerator::dopri5(LorenzDynamics::classic())
}

#[rstest]
fn lorenz_deterministic(generator: TrajectoryGenerator<LorenzDynamics, RSSStep>) {
    let x0 = Vector3::new(1.0, 1.0, 1.0);
    let traj_a = generator.integrate(x0, 0.0, 5.0, 0.01).unwrap();
    let traj_b = generator.integrate(x0, 0.0, 5.0, 0.01).unwrap();
    assert_eq!(traj_a, traj_b);
    println!("{traj_a}");

    // Stays on the attractor
    for sample in &traj_a {
        assert!(sample.state.norm() < 100.0);
    }
}

#[rstest]
#[case(0.0, 5.0, 0.01)]
#[case(0.0, 2.0, 0.05)]
#[case(1.0, 3.5, 0.1)]
#[case(0.0, 0.99, 0.1)]
fn lorenz_sample_count(
    generator: TrajectoryGenerator<LorenzDynamics, RSSStep>,
    #[case] t0: f64,
    #[case] t1: f64,
    #[case] step: f64,
) {
    let traj = generator
        .integrate(Vector3::new(1.0, 1.0, 1.0), t0, t1, step)
        .unwrap();
    let expected = (t1 - t0) / step;
    assert!(
        (traj.len() as f64 - expected).abs() <= 1.0,
        "{} samples for {expected}",
        traj.len()
    );

    let mtx = traj.to_matrix();
    assert_eq!(mtx.shape(), (traj.len(), 3));

    // Samples are on the regular grid after the initial time.
    for (k, epoch) in traj.epochs().iter().enumerate() {
        assert_abs_diff_eq!(*epoch, t0 + (k + 1) as f64 * step, epsilon = 1e-12);
    }
    let last = traj.last().unwrap().epoch;
    assert!(last >= t1 - 1e-12 && last < t1 + step);
}

#[rstest]
fn lorenz_noise(generator: TrajectoryGenerator<LorenzDynamics, RSSStep>) {
    let x0 = Vector3::new(1.0, 1.0, 1.0);
    let truth = generator.integrate(x0, 0.0, 2.0, 0.01).unwrap();

    // A noise with a zero sigma reproduces the noiseless trajectory exactly.
    let noiseless = generator
        .integrate_with_noise(
            x0,
            0.0,
            2.0,
            0.01,
            &mut WhiteNoise::new(0.0),
            &mut Pcg64Mcg::seed_from_u64(1),
        )
        .unwrap();
    assert_eq!(noiseless, truth);

    // Seeded noise is reproducible.
    let sigma = 0.1;
    let noisy_a = generator
        .integrate_with_noise(
            x0,
            0.0,
            2.0,
            0.01,
            &mut WhiteNoise::new(sigma),
            &mut Pcg64Mcg::seed_from_u64(1),
        )
        .unwrap();
    let noisy_b = generator
        .integrate_with_noise(
            x0,
            0.0,
            2.0,
            0.01,
            &mut WhiteNoise::new(sigma),
            &mut Pcg64Mcg::seed_from_u64(1),
        )
        .unwrap();
    assert_eq!(noisy_a, noisy_b);

    // Different seeds lead to different noise
    let noisy_c = generator
        .integrate_with_noise(
            x0,
            0.0,
            2.0,
            0.01,
            &mut WhiteNoise::new(sigma),
            &mut Pcg64Mcg::seed_from_u64(2),
        )
        .unwrap();
    assert_ne!(noisy_a, noisy_c);

    // The noise only perturbs the samples, and its statistics match the model.
    let errors = noisy_a.to_matrix() - truth.to_matrix();
    let count = errors.len() as f64;
    let mean = errors.sum() / count;
    let std_dev = (errors.map(|e| (e - mean).powi(2)).sum() / (count - 1.0)).sqrt();
    println!("noise mean = {mean:e}\tstd dev = {std_dev:e}");
    assert!(mean.abs() < 4.0 * sigma / count.sqrt());
    assert!((std_dev - sigma).abs() < 0.15 * sigma);
    assert_eq!(noisy_a.epochs(), truth.epochs());
}

#[rstest]
fn lorenz_integrators_agree() {
    // Over a short horizon, before the chaos amplifies the differences, all methods agree.
    let lorenz = LorenzDynamics::classic();
    let x0 = Vector3::new(1.0, 1.0, 1.0);
    let opts = PropOpts::with_adaptive_step(1e-9, 0.01, 1e-12, RSSStep);

    let reference = TrajectoryGenerator::new(Propagator::verner56(lorenz, opts))
        .integrate(x0, 0.0, 1.0, 0.1)
        .unwrap();

    for setup in [
        Propagator::dp45(lorenz, opts),
        Propagator::ck45(lorenz, opts),
        Propagator::new::<RK4Fixed>(lorenz, PropOpts::with_fixed_step(1e-4)),
    ] {
        let traj = TrajectoryGenerator::new(setup)
            .integrate(x0, 0.0, 1.0, 0.1)
            .unwrap();
        assert_eq!(traj.len(), reference.len());
        for (sample, ref_sample) in traj.iter().zip(reference.iter()) {
            assert_eq!(sample.epoch, ref_sample.epoch);
            assert!(
                (sample.state - ref_sample.state).norm() < 1e-6,
                "{} vs {} @ {}",
                sample.state,
                ref_sample.state,
                sample.epoch
            );
        }
    }
}

#[test]
fn lorenz_fixed_point_remains() {
    let lorenz = LorenzDynamics::classic();
    let [_, c_plus, _] = lorenz.fixed_points();
    let traj = TrajectoryGenerator::dopri5(lorenz)
        .integrate(c_plus, 0.0, 1.0, 0.1)
        .unwrap();
    for sample in &traj {
        assert!((sample.state - c_plus).norm() < 1e-9);
    }
}

#[test]
fn lorenz_from_yaml() {
    let opts = PropOpts::<RSSStep>::load(crate::test_config("prop_opts.yaml")).unwrap();
    assert_eq!(opts.init_step, 1e-3);
    assert_eq!(opts.min_step, 1e-9);
    assert_eq!(opts.max_step, 0.05);
    assert_eq!(opts.tolerance, 1e-11);
    assert_eq!(opts.attempts, 60);
    assert!(!opts.fixed_step);

    let models = LorenzDynamics::load_named(crate::test_config("lorenz.yaml")).unwrap();
    assert_eq!(models["classic"], LorenzDynamics::classic());
    assert_eq!(models["periodic"].rho, 99.96);
    assert_eq!(models["periodic"].sigma, 10.0);

    let generator = TrajectoryGenerator::new(Propagator::dp45(models["periodic"], opts));
    let traj = generator
        .integrate(Vector3::new(1.0, 1.0, 1.0), 0.0, 1.0, 0.25)
        .unwrap();
    assert_eq!(traj.len(), 4);

    // Invalid options are rejected before any propagation
    let mut bad_opts = opts;
    bad_opts.min_step = -1.0;
    let generator = TrajectoryGenerator::new(Propagator::dp45(LorenzDynamics::classic(), bad_opts));
    assert_eq!(
        generator
            .integrate(Vector3::new(1.0, 1.0, 1.0), 0.0, 1.0, 0.25)
            .unwrap_err(),
        PropagationError::InvalidStep { step: -1.0 }
    );
}
