//! A fixed-capacity ring buffer of transitions.
mod base;
mod batch;
mod config;
mod transition;
pub use base::SimpleReplayBuffer;
pub use batch::TransitionBatch;
pub use config::SimpleReplayBufferConfig;
pub use transition::Transition;
