//! Batch of transitions.

/// A batch of transitions as parallel arrays.
///
/// Observations and actions are flattened in row-major order, i.e.,
/// `obs[i * obs_dim..(i + 1) * obs_dim]` is the observation of the `i`-th sample.
#[derive(Clone, Debug)]
pub struct TransitionBatch {
    /// Observations.
    pub obs: Vec<f32>,

    /// Actions.
    pub act: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Terminal flags.
    pub is_terminated: Vec<i8>,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Slot indices of the samples in the buffer.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// The number of samples in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no sample.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
