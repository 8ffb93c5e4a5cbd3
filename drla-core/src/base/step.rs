//! Environment step.
use super::Env;
use crate::record::Record;

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with the metadata reported by the environment.
///
/// An environment emits a [`Step`] object at every interaction step.
/// The rollout collector pairs it with the previous observation to create
/// a transition `(o_t, a_t, r_t, o_t+1, terminal)`.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Next observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode ended by an environment-defined
    /// terminal condition.
    ///
    /// Truncation by a maximum path length is not termination.
    pub is_terminated: bool,

    /// Metadata reported by the environment.
    pub info: Record,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(obs: E::Obs, act: E::Act, reward: f32, is_terminated: bool, info: Record) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            info,
        }
    }
}

impl<E: Env> std::fmt::Debug for Step<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("act", &self.act)
            .field("obs", &self.obs)
            .field("reward", &self.reward)
            .field("is_terminated", &self.is_terminated)
            .field("info", &self.info)
            .finish()
    }
}
