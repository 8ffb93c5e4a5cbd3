//! Environment.
use super::{Act, Obs, Step};
use crate::space::BoxSpace;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Errors returned by [`Env::reset`] and [`Env::step`] are not retried by the
/// rollout collector; they terminate the run as
/// [`DrlaError::EnvironmentFault`](crate::error::DrlaError::EnvironmentFault).
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Space of observations. Its dimension is fixed for the lifetime of the environment.
    fn observation_space(&self) -> BoxSpace;

    /// Space of actions. Actions outside of it may be clipped by the environment.
    fn action_space(&self) -> BoxSpace;
}
