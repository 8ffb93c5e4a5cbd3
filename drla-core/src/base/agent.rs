//! Agent.
use super::{Env, ReplayBufferBase, StochasticPolicy};
use crate::record::Record;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Represents a trainable policy on an environment.
pub trait Agent<E: Env, R: ReplayBufferBase>: StochasticPolicy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs one optimization step on a batch sampled from the replay buffer
    /// and returns the diagnostics of the step.
    ///
    /// A non-finite loss aborts the step with
    /// [`DrlaError::NumericDivergence`](crate::error::DrlaError::NumericDivergence)
    /// before any parameter is modified.
    fn update(&mut self, batch: R::Batch) -> Result<Record>;

    /// Saves the parameters of the agent in the given directory
    /// and returns the paths of the written files.
    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Loads the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
