use crate::replay_buffer::Transition;

/// An ordered sequence of transitions produced by one rollout.
///
/// Only the final transition of a path may be terminal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    /// Transitions in the order they were produced.
    pub transitions: Vec<Transition>,
}

impl Path {
    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the path has no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Returns `true` if the path ended by environment termination.
    pub fn is_terminated(&self) -> bool {
        self.transitions
            .last()
            .map(|tr| tr.is_terminated)
            .unwrap_or(false)
    }

    /// Rewards of the transitions.
    pub fn rewards(&self) -> Vec<f32> {
        self.transitions.iter().map(|tr| tr.reward).collect()
    }

    /// Undiscounted sum of rewards.
    pub fn returns(&self) -> f32 {
        self.transitions.iter().map(|tr| tr.reward).sum()
    }

    /// Action values of all transitions, flattened.
    pub fn actions(&self) -> Vec<f32> {
        self.transitions
            .iter()
            .flat_map(|tr| tr.act.iter().copied())
            .collect()
    }
}

impl From<Vec<Transition>> for Path {
    fn from(transitions: Vec<Transition>) -> Self {
        Self { transitions }
    }
}
