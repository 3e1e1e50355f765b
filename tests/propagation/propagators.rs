use lorenz_mle::linalg::Vector2;
use lorenz_mle::propagators::error_ctrl::{LargestError, RSSState};
use lorenz_mle::propagators::*;
use rstest::*;
use std::sync::mpsc::channel;

use super::HarmonicOscillator;

#[fixture]
fn oscillator() -> HarmonicOscillator {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    HarmonicOscillator { omega: 2.0 }
}

#[rstest]
fn oscillator_adaptive(oscillator: HarmonicOscillator) {
    let x0 = Vector2::new(1.0, 0.0);
    let duration = 10.0;
    let exact = oscillator.exact(duration);
    let opts = PropOpts::with_adaptive_step(1e-6, 0.1, 1e-12, RSSStep);

    for (name, setup) in [
        ("Dormand45", Propagator::dp45(oscillator, opts)),
        ("CashKarp45", Propagator::ck45(oscillator, opts)),
        ("Verner56", Propagator::verner56(oscillator, opts)),
    ] {
        let mut prop = setup.with(x0, 0.0);
        let end = prop.for_duration(duration).unwrap();
        let err = (end - exact).norm();
        println!("{name}: error = {err:e}\t{}", prop.latest_details());
        assert!(err < 1e-7, "{name} error too large: {err:e}");
        assert_eq!(prop.epoch, duration, "{name} did not land on the end time");
    }
}

#[rstest]
fn oscillator_error_controllers(oscillator: HarmonicOscillator) {
    let x0 = Vector2::new(1.0, 0.0);
    let exact = oscillator.exact(5.0);

    let setup = Propagator::dp45(
        oscillator,
        PropOpts::with_adaptive_step(1e-6, 0.1, 1e-12, LargestError),
    );
    let end = setup.with(x0, 0.0).until_epoch(5.0).unwrap();
    assert!((end - exact).norm() < 1e-7);

    let setup = Propagator::dp45(
        oscillator,
        PropOpts::with_adaptive_step(1e-6, 0.1, 1e-12, RSSState),
    );
    let end = setup.with(x0, 0.0).until_epoch(5.0).unwrap();
    assert!((end - exact).norm() < 1e-7);
}

#[rstest]
fn oscillator_fixed(oscillator: HarmonicOscillator) {
    let x0 = Vector2::new(1.0, 0.0);
    let duration = 2.0;
    let exact = oscillator.exact(duration);

    let errors: Vec<f64> = [1e-2, 5e-3]
        .iter()
        .map(|step| {
            let setup = Propagator::new::<RK4Fixed>(oscillator, PropOpts::with_fixed_step(*step));
            let mut prop = setup.with(x0, 0.0);
            let end = prop.for_duration(duration).unwrap();
            (end - exact).norm()
        })
        .collect();

    // Fourth order: halving the step divides the error by about 16.
    let ratio = errors[0] / errors[1];
    println!("RK4 errors: {errors:?}, ratio = {ratio}");
    assert!(errors[0] < 1e-6);
    assert!(ratio > 12.0 && ratio < 20.0);

    // The midpoint method is second order and much less accurate at the same step.
    let setup = Propagator::new::<RK2Fixed>(oscillator, PropOpts::with_fixed_step(1e-2));
    let end = setup.with(x0, 0.0).for_duration(duration).unwrap();
    let rk2_err = (end - exact).norm();
    assert!(rk2_err < 2e-3);
    assert!(rk2_err > errors[0]);
}

#[rstest]
fn oscillator_backprop(oscillator: HarmonicOscillator) {
    let x0 = Vector2::new(1.0, 0.0);
    let setup = Propagator::default(oscillator);
    let mut prop = setup.with(x0, 0.0);
    let forward = prop.for_duration(3.0).unwrap();
    assert!((forward - oscillator.exact(3.0)).norm() < 1e-8);

    let back = prop.for_duration(-3.0).unwrap();
    assert_eq!(prop.epoch, 0.0);
    assert!((back - x0).norm() < 1e-8, "backprop error: {}", (back - x0).norm());
}

#[rstest]
fn oscillator_traj(oscillator: HarmonicOscillator) {
    let x0 = Vector2::new(1.0, 0.0);
    let setup = Propagator::dp45(oscillator, PropOpts::with_max_step(0.05));
    let mut prop = setup.with(x0, 0.0);
    let (end, traj) = prop.until_epoch_with_traj(1.0).unwrap();

    assert_eq!(traj.first().unwrap().epoch, 0.0);
    assert_eq!(traj.first().unwrap().state, x0);
    assert_eq!(traj.last().unwrap().epoch, 1.0);
    assert_eq!(traj.last().unwrap().state, end);
    // At least one state every max step
    assert!(traj.len() >= 21);
    let epochs = traj.epochs();
    assert!(epochs.windows(2).all(|w| w[0] < w[1]));
    for sample in &traj {
        assert!((sample.state - oscillator.exact(sample.epoch)).norm() < 1e-9);
    }

    // The same steps are published on a channel
    let (tx, rx) = channel();
    let mut prop = setup.with(x0, 0.0);
    prop.for_duration_with_channel(1.0, tx).unwrap();
    let published: Vec<_> = rx.iter().collect();
    assert_eq!(published.len(), traj.len() - 1);
}

#[test]
fn invalid_propagation() {
    let oscillator = HarmonicOscillator { omega: 1.0 };
    let setup = Propagator::default(oscillator);
    let mut prop = setup.with(Vector2::new(1.0, 0.0), 0.0);
    assert!(matches!(
        prop.for_duration(f64::INFINITY).unwrap_err(),
        PropagationError::InvalidSpan { .. }
    ));
    // A null duration is a no-op
    assert_eq!(prop.for_duration(0.0).unwrap(), Vector2::new(1.0, 0.0));

    prop.set_step(0.0, true);
    assert_eq!(
        prop.for_duration(1.0).unwrap_err(),
        PropagationError::InvalidStep { step: 0.0 }
    );
}
