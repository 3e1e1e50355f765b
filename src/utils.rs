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

use crate::linalg::DMatrix;
use approx::relative_eq;
use na::linalg::SVD;

/// Maximum number of iterations of the singular value decomposition.
const SVD_MAX_ITER: usize = 1000;

/// Returns the symmetric part of the provided square matrix, i.e. (M + Mᵀ) / 2.
pub fn symmetrize(m: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (m + m.transpose())
}

/// Returns whether the provided matrix is square and symmetric, up to the provided relative tolerance.
pub fn is_symmetric(m: &DMatrix<f64>, tolerance: f64) -> bool {
    if !m.is_square() {
        return false;
    }
    let scale = m.amax().max(1.0);
    for i in 1..m.nrows() {
        for j in 0..i {
            if !relative_eq!(
                m[(i, j)],
                m[(j, i)],
                epsilon = tolerance * scale,
                max_relative = tolerance
            ) {
                return false;
            }
        }
    }
    true
}

/// Returns the smallest eigenvalue of the provided symmetric matrix.
///
/// Only the lower triangle of the matrix is read.
pub fn min_eigenvalue(m: &DMatrix<f64>) -> f64 {
    m.symmetric_eigenvalues().min()
}

/// Returns whether the provided symmetric matrix is positive semi-definite, i.e. all of its eigenvalues are positive or nil.
///
/// Eigenvalues down to `-tolerance * max(1, |M|_max)` are accepted to allow for rounding errors.
pub fn is_positive_semi_definite(m: &DMatrix<f64>, tolerance: f64) -> bool {
    if m.is_empty() {
        return true;
    }
    min_eigenvalue(m) >= -tolerance * m.amax().max(1.0)
}

/// Returns the reciprocal condition number of the provided matrix, computed from its singular values.
///
/// This is zero for a singular matrix and one for a perfectly conditioned one. A matrix with non-finite
/// entries, or whose decomposition does not converge, is reported as singular.
pub fn rcond(m: &DMatrix<f64>) -> f64 {
    if m.is_empty() {
        return 1.0;
    }
    if !m.iter().all(|v| v.is_finite()) {
        return 0.0;
    }
    let Some(svd) = SVD::try_new_unordered(m.clone(), false, false, f64::EPSILON, SVD_MAX_ITER)
    else {
        return 0.0;
    };
    let sv = svd.singular_values;
    let s_max = sv.max();
    if s_max == 0.0 || !s_max.is_finite() {
        return 0.0;
    }
    sv.min() / s_max
}
