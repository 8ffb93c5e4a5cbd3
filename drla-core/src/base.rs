//! Core traits and data types shared by environments, policies and agents.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::{MakeDeterministic, Policy, StochasticPolicy, UniformRandomPolicy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::Step;

/// An observation of an environment.
///
/// Observations are fixed-length `f32` vectors whose length is the
/// dimension of [`Env::observation_space`].
pub trait Obs: Clone + Debug + AsRef<[f32]> {
    /// Returns the dimension of the observation.
    fn len(&self) -> usize {
        self.as_ref().len()
    }
}

/// An action of an environment.
///
/// Actions are fixed-length `f32` vectors. Policies producing actions from
/// network outputs build them with `From<Vec<f32>>`.
pub trait Act: Clone + Debug + AsRef<[f32]> + From<Vec<f32>> {
    /// Returns the dimension of the action.
    fn len(&self) -> usize {
        self.as_ref().len()
    }
}

/// A plain vector observation.
#[derive(Clone, Debug, PartialEq)]
pub struct VecObs(pub Vec<f32>);

impl AsRef<[f32]> for VecObs {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for VecObs {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

impl Obs for VecObs {}

/// A plain vector action.
#[derive(Clone, Debug, PartialEq)]
pub struct VecAct(pub Vec<f32>);

impl AsRef<[f32]> for VecAct {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for VecAct {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

impl Act for VecAct {}
