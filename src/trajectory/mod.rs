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

use crate::linalg::allocator::Allocator;
use crate::linalg::{DMatrix, DVector, DefaultAllocator, DimName, OVector};
use crate::noise::Stochastics;
use rand::Rng;
use std::fmt;

mod generator;
pub use generator::TrajectoryGenerator;

/// A single time tagged state of a trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<N: DimName>
where
    DefaultAllocator: Allocator<N>,
{
    pub epoch: f64,
    pub state: OVector<f64, N>,
}

impl<N: DimName> Sample<N>
where
    DefaultAllocator: Allocator<N>,
{
    /// Returns the state as a dynamically sized vector, e.g. to use it as an observation.
    pub fn as_dvector(&self) -> DVector<f64> {
        DVector::from_iterator(N::dim(), self.state.iter().copied())
    }
}

/// Store a trajectory of any state, in chronological order of propagation.
#[derive(Clone, Debug, PartialEq)]
pub struct Traj<N: DimName>
where
    DefaultAllocator: Allocator<N>,
{
    /// Optionally name this trajectory
    pub name: Option<String>,
    /// We use a vector because we know that the states are produced in a chronological manner (the direction does not matter).
    pub states: Vec<Sample<N>>,
}

impl<N: DimName> Traj<N>
where
    DefaultAllocator: Allocator<N>,
{
    pub fn new() -> Self {
        Self {
            name: None,
            states: Vec::new(),
        }
    }

    /// Orders the states by their epoch and removes the duplicate epochs.
    pub fn finalize(&mut self) {
        self.states.sort_by(|a, b| a.epoch.total_cmp(&b.epoch));
        self.states.dedup_by(|a, b| a.epoch == b.epoch);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&Sample<N>> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&Sample<N>> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample<N>> {
        self.states.iter()
    }

    /// Returns the epochs of all of the samples.
    pub fn epochs(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.epoch).collect()
    }

    /// Returns all of the states as a matrix, one row per sample and one column per state component.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.states.len(), N::dim(), |i, j| self.states[i].state[j])
    }

    /// Returns a copy of this trajectory where each component of each state was perturbed by an
    /// independent sample of the provided noise.
    pub fn with_noise<S: Stochastics, R: Rng>(&self, noise: &mut S, rng: &mut R) -> Self {
        let states = self
            .states
            .iter()
            .map(|sample| Sample {
                epoch: sample.epoch,
                state: sample.state.map(|x| x + noise.sample(sample.epoch, rng)),
            })
            .collect();

        Self {
            name: self.name.clone(),
            states,
        }
    }
}

impl<N: DimName> Default for Traj<N>
where
    DefaultAllocator: Allocator<N>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, N: DimName> IntoIterator for &'a Traj<N>
where
    DefaultAllocator: Allocator<N>,
{
    type Item = &'a Sample<N>;
    type IntoIter = std::slice::Iter<'a, Sample<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

impl<N: DimName> fmt::Display for Traj<N>
where
    DefaultAllocator: Allocator<N>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Empty trajectory");
        }
        let name = self.name.as_deref().unwrap_or("Trajectory");
        write!(
            f,
            "{name} from {} to {} ({} states)",
            self.states[0].epoch,
            self.states[self.len() - 1].epoch,
            self.len()
        )
    }
}
