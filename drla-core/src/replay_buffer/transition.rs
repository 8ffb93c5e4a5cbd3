use crate::record::Record;

/// One environment interaction step `(o_t, a_t, r_t, o_t+1, terminal)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Observation.
    pub obs: Vec<f32>,

    /// Action taken at `obs`.
    pub act: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Observation after the action.
    pub next_obs: Vec<f32>,

    /// `true` if the episode ended by an environment-defined terminal condition.
    pub is_terminated: bool,

    /// Metadata reported by the environment.
    pub env_info: Record,

    /// Metadata reported by the policy.
    pub agent_info: Record,
}
