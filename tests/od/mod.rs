use lorenz_mle::linalg::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

mod chaining;

/// Returns a random vector of the provided length whose components are standard normal.
pub(crate) fn randn<R: Rng>(n: usize, rng: &mut R) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.sample(StandardNormal))
}

/// Returns a random m x n matrix whose components are standard normal.
pub(crate) fn randn_mat<R: Rng>(m: usize, n: usize, rng: &mut R) -> DMatrix<f64> {
    DMatrix::from_fn(m, n, |_, _| rng.sample(StandardNormal))
}

/// Returns a random symmetric positive definite matrix, whose eigenvalues are all greater than `floor`.
pub(crate) fn random_spd<R: Rng>(n: usize, floor: f64, rng: &mut R) -> DMatrix<f64> {
    let a = randn_mat(n, n, rng);
    let spd = &a * a.transpose() + DMatrix::from_diagonal_element(n, n, floor);
    0.5 * (&spd + spd.transpose())
}
